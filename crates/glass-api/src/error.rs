use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("rate limit exceeded, retry in {}s", retry_secs(.retry_after))]
    RateLimited { retry_after: Duration },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Whole seconds a rate limited client should wait, rounded up.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            ApiError::RateLimited { retry_after } => Some(retry_secs(retry_after)),
            _ => None,
        }
    }
}

fn retry_secs(d: &Duration) -> u64 {
    (d.as_secs() + u64::from(d.subsec_nanos() > 0)).max(1)
}

#[cfg(feature = "http")]
mod response {
    use axum::{
        Json,
        http::{HeaderValue, StatusCode, header},
        response::{IntoResponse, Response},
    };
    use serde::Serialize;

    use super::ApiError;

    #[derive(Serialize)]
    struct ErrorBody {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        retry_after_secs: Option<u64>,
    }

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            let status = match &self {
                ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                ApiError::CommandNotFound(_) => StatusCode::NOT_FOUND,
                ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let retry_after_secs = self.retry_after_secs();
            let body = ErrorBody {
                error: self.to_string(),
                retry_after_secs,
            };

            let mut response = (status, Json(body)).into_response();
            if let Some(secs) = retry_after_secs {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs));
            }
            response
        }
    }
}
