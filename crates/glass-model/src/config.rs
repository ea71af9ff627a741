//! Configuration structures.
//!
//! Every section has a `Default` so a config file only needs to spell out what differs.
//! Parsing the file itself is left to the binary.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::CommandCatalog;

/// Top-level daemon configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen: ListenConfig,
    pub rate_limit: RateLimitConfig,
    pub info: ServerInfo,
    pub dns: DnsConfig,
    pub commands: CommandCatalog,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// `text`, `json` or `journald`.
    pub log_format: String,
    pub tls: bool,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            tls: false,
        }
    }
}

/// Per-session sliding window admission settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_commands: usize,
    /// Window length in seconds.
    pub time_window: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.time_window)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_commands: 10,
            time_window: 60,
        }
    }
}

/// Static host description shown to clients.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerInfo {
    pub name: String,
    pub location: String,
    pub datacenter: String,
    pub test_ip: String,
    pub description: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        let na = || "N/A".to_string();
        Self {
            name: String::new(),
            location: na(),
            datacenter: na(),
            test_ip: na(),
            description: na(),
        }
    }
}

/// A DNS-over-HTTPS endpoint speaking the JSON API (`application/dns-json`).
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    pub url: String,
}

impl EndpointConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    pub endpoints: Vec<EndpointConfig>,
    /// Domain resolved by the latency prober.
    pub probe_domain: String,
    pub probe_interval_secs: u64,
    /// Deadline for the DoH part of one resolution (current endpoint + race).
    pub resolve_timeout_ms: u64,
    /// Deadline for a single endpoint query.
    pub query_timeout_ms: u64,
    /// Latency recorded for an endpoint whose probe failed.
    pub failure_penalty_ms: u64,
}

impl DnsConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn failure_penalty(&self) -> Duration {
        Duration::from_millis(self.failure_penalty_ms)
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                EndpointConfig::new("Alibaba", "https://223.5.5.5/resolve"),
                EndpointConfig::new("Google", "https://8.8.8.8/resolve"),
            ],
            probe_domain: "www.google.com".to_string(),
            probe_interval_secs: 300,
            resolve_timeout_ms: 5_000,
            query_timeout_ms: 3_000,
            failure_penalty_ms: 10_000,
        }
    }
}
