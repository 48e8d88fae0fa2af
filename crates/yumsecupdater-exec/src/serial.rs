//! Serialized command execution
//!
//! yum holds a global lock on the rpm database and aborts when another
//! instance is already running. Every component that shells out shares one
//! [`SerialExecutor`] so at most one external command is in flight.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::command::CommandSpec;
use crate::error::ExecError;
use crate::result::CommandResult;
use crate::traits::CommandExecutor;

/// Executor wrapper that runs commands one at a time
///
/// Clones share the same lock.
#[derive(Clone)]
pub struct SerialExecutor {
    inner: Arc<dyn CommandExecutor>,
    lock: Arc<Mutex<()>>,
}

impl SerialExecutor {
    /// Wrap an executor with a fresh lock
    pub fn new(inner: Arc<dyn CommandExecutor>) -> Self {
        Self {
            inner,
            lock: Arc::new(Mutex::new(())),
        }
    }
}

#[async_trait]
impl CommandExecutor for SerialExecutor {
    #[instrument(skip_all, fields(command = %cmd))]
    async fn run(&self, cmd: &CommandSpec) -> Result<CommandResult, ExecError> {
        // Released on every return path when the guard drops.
        let _guard = self.lock.lock().await;
        info!("running command");
        self.inner.run(cmd).await
    }
}
