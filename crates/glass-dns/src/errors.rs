use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DnsError {
    #[error("no DoH endpoints configured")]
    NoEndpoints,

    #[error("invalid endpoint url {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint returned status {0}")]
    Status(u16),

    #[error("malformed DoH response: {0}")]
    Decode(String),

    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    #[error("system resolver failed: {0}")]
    System(String),

    #[error("failed to resolve {domain}: {reason}")]
    Exhausted { domain: String, reason: String },
}
