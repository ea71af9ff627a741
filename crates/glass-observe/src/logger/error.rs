use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format {0:?}, expected text, json or journald")]
    InvalidFormat(String),
    #[error("invalid log filter {directive:?}: {reason}")]
    InvalidLevel { directive: String, reason: String },
    #[error("journald output is unavailable in this build")]
    JournaldUnavailable,
    #[error("a global subscriber is already installed")]
    AlreadyInitialized,
    #[error("journald socket: {0}")]
    Journald(String),
}
