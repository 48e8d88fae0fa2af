//! Command executor trait

use async_trait::async_trait;

use crate::command::CommandSpec;
use crate::error::ExecError;
use crate::result::CommandResult;

#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run the command to completion and capture its output
    async fn run(&self, cmd: &CommandSpec) -> Result<CommandResult, ExecError>;
}
