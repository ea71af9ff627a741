use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use glass_core::RateLimiter;
use glass_exec::{Execution, Launcher};
use glass_model::{CommandId, ServerInfo};

use crate::{
    error::ApiError,
    handler::ApiHandler,
    request::{ConfigView, ExecuteRequest},
};

/// [`ApiHandler`] backed by a [`Launcher`] and a per-session [`RateLimiter`].
pub struct GlassAdapter {
    launcher: Launcher,
    limiter: Arc<RateLimiter>,
    info: ServerInfo,
    version: String,
}

impl GlassAdapter {
    pub fn new(launcher: Launcher, limiter: Arc<RateLimiter>, info: ServerInfo) -> Self {
        Self {
            launcher,
            limiter,
            info,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

#[async_trait]
impl ApiHandler for GlassAdapter {
    async fn config(&self) -> Result<ConfigView, ApiError> {
        Ok(ConfigView {
            version: self.version.clone(),
            host: self.info.clone(),
            commands: self.launcher.catalog().infos(),
        })
    }

    async fn execute(&self, req: ExecuteRequest) -> Result<Execution, ApiError> {
        let session = req.session_id.trim();
        if session.is_empty() {
            return Err(ApiError::InvalidRequest("session_id is required".into()));
        }
        if req.command.trim().is_empty() {
            return Err(ApiError::InvalidRequest("command is required".into()));
        }

        if !self.limiter.check(session) {
            let retry_after = self.limiter.remaining(session);
            warn!(target: "glass.api", session, command = %req.command, ?retry_after, "rate limit exceeded");
            return Err(ApiError::RateLimited { retry_after });
        }
        if self.launcher.catalog().get(&req.command).is_none() {
            return Err(ApiError::CommandNotFound(req.command));
        }

        let execution = self
            .launcher
            .execute(&req.command, &req.target, session, req.ip_version)
            .await;
        info!(target: "glass.api", session, command_id = %execution.id, "command accepted");
        Ok(execution)
    }

    async fn stop(&self, id: &CommandId) -> Result<bool, ApiError> {
        Ok(self.launcher.stop(id))
    }
}
