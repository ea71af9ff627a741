use thiserror::Error;

use glass_core::CoreError;
use glass_dns::DnsError;
use glass_model::CommandId;

pub type ExecResult<T> = Result<T, ExecError>;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("command not found: {0}")]
    CommandNotFound(String),
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    #[error("{0}")]
    Resolution(#[from] DnsError),
    #[error("no IP addresses found for domain: {0}")]
    NoAddresses(String),
    #[error("command already running: {0}")]
    AlreadyRunning(CommandId),
    #[error("empty command line")]
    EmptyCommand,
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("non-zero exit code: {code}")]
    NonZeroExit { code: i32 },
    #[error("killed by signal")]
    KilledBySignal,
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ExecError {
    fn from(e: std::io::Error) -> Self {
        ExecError::Io(e.to_string())
    }
}

impl From<CoreError> for ExecError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::DuplicateCommand(id) => ExecError::AlreadyRunning(id),
        }
    }
}
