//! Turning a command line into a child process and draining its pipes.
use tokio::process::Command;

use crate::{error::ExecError, util::cmd_program};

pub mod shell;
pub(crate) mod stream;

/// How a fully built command line is started.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    /// Executed directly, the line split on whitespace.
    Direct { program: String, args: Vec<String> },
    /// Handed to the platform shell as a single script.
    Shell { script: String },
}

impl Invocation {
    /// Pick shell or direct execution for `line`.
    ///
    /// Lines containing shell operators (`|`, `&`, `>`, `<`, `;`) go through the shell so
    /// that pipes and redirections in templates keep working.
    pub fn from_line(line: &str) -> Result<Self, ExecError> {
        if shell::needs_shell(line) {
            return Ok(Invocation::Shell {
                script: line.to_string(),
            });
        }

        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(ExecError::EmptyCommand)?;
        Ok(Invocation::Direct {
            program,
            args: parts.collect(),
        })
    }

    pub fn is_shell(&self) -> bool {
        matches!(self, Invocation::Shell { .. })
    }

    pub(crate) fn command(&self) -> Command {
        match self {
            Invocation::Direct { program, args } => cmd_program(program, args),
            Invocation::Shell { script } => shell::shell_command(script),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_line_is_split_on_whitespace() {
        let inv = Invocation::from_line("ping -c 4   192.0.2.1").unwrap();
        assert_eq!(
            inv,
            Invocation::Direct {
                program: "ping".into(),
                args: vec!["-c".into(), "4".into(), "192.0.2.1".into()],
            }
        );
        assert!(!inv.is_shell());
    }

    #[test]
    fn operators_select_the_shell() {
        for line in [
            "mtr -r 1.1.1.1 | head -5",
            "traceroute 1.1.1.1 2>&1",
            "a && b",
            "a || b",
            "echo x > /dev/null",
            "cat < /etc/hosts",
            "uptime; date",
        ] {
            let inv = Invocation::from_line(line).unwrap();
            assert_eq!(
                inv,
                Invocation::Shell {
                    script: line.to_string()
                },
                "{line}"
            );
        }
    }

    #[test]
    fn blank_line_is_rejected() {
        assert!(matches!(
            Invocation::from_line("   "),
            Err(ExecError::EmptyCommand)
        ));
    }
}
