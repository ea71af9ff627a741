use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};

static SEQ: AtomicU64 = AtomicU64::new(1);

/// Identifier of a single command invocation.
///
/// With a target the id is deterministic (`{command}-{target}-{session}`), so a client that
/// reconnects can rebuild it. Without a target it is made unique with a process-wide sequence.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(String);

impl CommandId {
    pub fn generate(command: &str, target: &str, session: &str) -> Self {
        if target.is_empty() {
            let seq = SEQ.fetch_add(1, Ordering::Relaxed);
            Self(format!("{command}-{session}-{seq}"))
        } else {
            Self(format!("{command}-{target}-{session}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CommandId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CommandId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for CommandId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_ids_are_deterministic() {
        let a = CommandId::generate("ping", "1.1.1.1", "s1");
        let b = CommandId::generate("ping", "1.1.1.1", "s1");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "ping-1.1.1.1-s1");
    }

    #[test]
    fn targetless_ids_are_unique() {
        let a = CommandId::generate("uptime", "", "s1");
        let b = CommandId::generate("uptime", "", "s1");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("uptime-s1-"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = CommandId::from("mtr-example.com-abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"mtr-example.com-abc\"");
    }
}
