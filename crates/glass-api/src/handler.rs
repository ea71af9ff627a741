use async_trait::async_trait;
use glass_exec::Execution;
use glass_model::{CommandId, SessionId};
use uuid::Uuid;

use crate::{
    error::ApiError,
    request::{ConfigView, ExecuteRequest},
};

/// Looking-glass API handler.
///
/// This trait abstracts the backend implementation, allowing users to:
/// - Use the provided `GlassAdapter`
/// - Wrap it with additional logic (auth, auditing, etc.)
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Mint a new session identifier.
    fn new_session(&self) -> SessionId {
        Uuid::new_v4().to_string()
    }

    /// Server description and the command catalog.
    async fn config(&self) -> Result<ConfigView, ApiError>;

    /// Admit and start a command. Failures after admission arrive on the event stream.
    async fn execute(&self, req: ExecuteRequest) -> Result<Execution, ApiError>;

    /// Request a stop; `false` if the command is unknown or already stopping.
    async fn stop(&self, id: &CommandId) -> Result<bool, ApiError>;
}
