use serde::{Deserialize, Serialize};

use glass_model::{CommandInfo, IpVersion, ServerInfo, SessionId};

/// Body of `POST /api/v1/commands`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub command: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub ip_version: IpVersion,
    pub session_id: SessionId,
}

/// What a client needs to render its command picker.
#[derive(Clone, Debug, Serialize)]
pub struct ConfigView {
    pub version: String,
    pub host: ServerInfo,
    pub commands: Vec<CommandInfo>,
}
