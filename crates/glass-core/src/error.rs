use thiserror::Error;

use glass_model::CommandId;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("command already running: {0}")]
    DuplicateCommand(CommandId),
}
