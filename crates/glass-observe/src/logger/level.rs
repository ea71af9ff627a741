use std::{fmt, str::FromStr};

use tracing_subscriber::EnvFilter;

use crate::logger::error::LoggerError;

/// A validated `EnvFilter` directive string.
///
/// Plain level names from older configs (`warning`, `fatal`, `panic`) are mapped onto the
/// closest `tracing` level; anything else must be a valid directive such as
/// `info,glass.dns=debug`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerLevel(String);

impl LoggerLevel {
    pub fn new(level: impl AsRef<str>) -> Result<Self, LoggerError> {
        let raw = level.as_ref().trim();
        let norm = match raw.to_ascii_lowercase().as_str() {
            "" => "info".to_string(),
            "warning" => "warn".to_string(),
            "fatal" | "panic" => "error".to_string(),
            _ => raw.to_string(),
        };
        parse_filter(&norm)?;
        Ok(Self(norm))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn filter(&self) -> Result<EnvFilter, LoggerError> {
        parse_filter(&self.0)
    }
}

fn parse_filter(directive: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(directive).map_err(|e| LoggerError::InvalidLevel {
        directive: directive.to_string(),
        reason: e.to_string(),
    })
}

impl Default for LoggerLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

impl FromStr for LoggerLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoggerLevel::new(s)
    }
}

impl fmt::Display for LoggerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
