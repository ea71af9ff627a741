use std::{fmt, str::FromStr};

use crate::logger::error::LoggerError;

/// Output encoding of the global subscriber.
///
/// `Journald` always parses; whether this build can actually write to the journal is only
/// known when the logger is installed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LoggerFormat {
    #[default]
    Text,
    Json,
    Journald,
}

impl LoggerFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Journald => "journald",
        }
    }
}

impl FromStr for LoggerFormat {
    type Err = LoggerError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let name = raw.trim();
        if name.is_empty() {
            return Ok(Self::default());
        }
        [Self::Text, Self::Json, Self::Journald]
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(name))
            .or_else(|| name.eq_ignore_ascii_case("journal").then_some(Self::Journald))
            .ok_or_else(|| LoggerError::InvalidFormat(raw.to_string()))
    }
}

impl fmt::Display for LoggerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
