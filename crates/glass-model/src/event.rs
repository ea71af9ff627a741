use serde::{Deserialize, Serialize};

/// One item of a command's output stream.
///
/// `Complete` and `Stopped` are terminal: exactly one of them ends every stream and nothing
/// follows it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OutputEvent {
    /// A line read from stdout or stderr, without its trailing newline.
    Data { text: String, stderr: bool },
    /// A failure that happened before the process could run.
    Error { message: String },
    /// The process ended on its own (or never started).
    Complete {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// The process was killed by a stop request.
    Stopped,
}

impl OutputEvent {
    pub fn stdout(text: impl Into<String>) -> Self {
        OutputEvent::Data {
            text: text.into(),
            stderr: false,
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        OutputEvent::Data {
            text: text.into(),
            stderr: true,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        OutputEvent::Error {
            message: message.into(),
        }
    }

    pub fn success() -> Self {
        OutputEvent::Complete {
            success: true,
            message: None,
        }
    }

    pub fn failure(message: Option<String>) -> Self {
        OutputEvent::Complete {
            success: false,
            message,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OutputEvent::Complete { .. } | OutputEvent::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_complete_and_stopped_are_terminal() {
        assert!(!OutputEvent::stdout("x").is_terminal());
        assert!(!OutputEvent::error("x").is_terminal());
        assert!(OutputEvent::success().is_terminal());
        assert!(OutputEvent::failure(None).is_terminal());
        assert!(OutputEvent::Stopped.is_terminal());
    }

    #[test]
    fn data_event_json_shape() {
        let json = serde_json::to_value(OutputEvent::stderr("boom")).unwrap();
        assert_eq!(json["kind"], "data");
        assert_eq!(json["text"], "boom");
        assert_eq!(json["stderr"], true);
    }

    #[test]
    fn complete_omits_missing_message() {
        let json = serde_json::to_string(&OutputEvent::success()).unwrap();
        assert_eq!(json, r#"{"kind":"complete","success":true}"#);
    }
}
