//! yumsecupdater-exec: External command execution
//!
//! Provides the command representation, the host-namespace wrapper, a local
//! executor backed by `tokio::process` and the serializing executor that
//! guarantees a single external command runs at a time.

pub mod command;
pub mod error;
pub mod local;
pub mod result;
pub mod serial;
pub mod traits;

pub use command::CommandSpec;
pub use error::ExecError;
pub use local::LocalExecutor;
pub use result::CommandResult;
pub use serial::SerialExecutor;
pub use traits::CommandExecutor;
