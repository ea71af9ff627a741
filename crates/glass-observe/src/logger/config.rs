use crate::logger::{format::LoggerFormat, level::LoggerLevel};

/// Settings for [`init_logger`](crate::init_logger).
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directives, e.g. `info,glass.exec=debug`.
    pub level: LoggerLevel,
    /// Print the `glass.*` target of each event.
    pub with_targets: bool,
    /// ANSI colors, text output only.
    pub use_color: bool,
}

impl LoggerConfig {
    /// Build from the raw strings found in the daemon's `listen` section.
    pub fn from_parts(format: &str, level: &str) -> Result<Self, crate::LoggerError> {
        Ok(Self {
            format: format.parse()?,
            level: LoggerLevel::new(level)?,
            ..Default::default()
        })
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            with_targets: true,
            use_color: atty::is(atty::Stream::Stdout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoggerError;

    #[test]
    fn builds_from_daemon_strings() {
        let cfg = LoggerConfig::from_parts("json", "warning").unwrap();
        assert_eq!(cfg.format, LoggerFormat::Json);
        assert_eq!(cfg.level.as_str(), "warn");
        assert!(cfg.with_targets);
    }

    #[test]
    fn bad_format_is_reported_first() {
        assert!(matches!(
            LoggerConfig::from_parts("yaml", "glass=loud"),
            Err(LoggerError::InvalidFormat(_))
        ));
    }
}
