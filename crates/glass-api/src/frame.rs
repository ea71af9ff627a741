use serde::{Deserialize, Serialize};

use glass_model::{CommandId, OutputEvent};

/// One server-sent event on a command stream.
///
/// The first frame is always `Started`; the last is `Complete` or `Stopped`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    Started {
        command_id: CommandId,
    },
    Output {
        output: String,
        is_error: bool,
    },
    Error {
        error: String,
    },
    Complete {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Stopped,
}

impl Frame {
    /// SSE `event:` name.
    pub fn name(&self) -> &'static str {
        match self {
            Frame::Started { .. } => "started",
            Frame::Output { .. } => "output",
            Frame::Error { .. } => "error",
            Frame::Complete { .. } => "complete",
            Frame::Stopped => "stopped",
        }
    }
}

impl From<OutputEvent> for Frame {
    fn from(ev: OutputEvent) -> Self {
        match ev {
            OutputEvent::Data { text, stderr } => Frame::Output {
                output: text,
                is_error: stderr,
            },
            OutputEvent::Error { message } => Frame::Error { error: message },
            OutputEvent::Complete { success, message } => Frame::Complete {
                success,
                error: message,
            },
            OutputEvent::Stopped => Frame::Stopped,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn to_json(f: Frame) -> serde_json::Value {
        serde_json::to_value(f).unwrap()
    }

    #[test]
    fn wire_shapes() {
        assert_eq!(
            to_json(Frame::Started {
                command_id: "ping-1.1.1.1-s".into()
            }),
            json!({"type": "started", "command_id": "ping-1.1.1.1-s"})
        );
        assert_eq!(
            to_json(OutputEvent::stderr("oops").into()),
            json!({"type": "output", "output": "oops", "is_error": true})
        );
        assert_eq!(
            to_json(OutputEvent::success().into()),
            json!({"type": "complete", "success": true})
        );
        assert_eq!(
            to_json(OutputEvent::failure(Some("non-zero exit code: 1".into())).into()),
            json!({"type": "complete", "success": false, "error": "non-zero exit code: 1"})
        );
        assert_eq!(to_json(OutputEvent::Stopped.into()), json!({"type": "stopped"}));
    }

    #[test]
    fn names_match_type_tag() {
        let frames = [
            Frame::Started {
                command_id: "x".into(),
            },
            OutputEvent::stdout("a").into(),
            OutputEvent::error("e").into(),
            OutputEvent::success().into(),
            Frame::Stopped,
        ];
        for f in frames {
            let name = f.name();
            assert_eq!(to_json(f)["type"], name);
        }
    }
}
