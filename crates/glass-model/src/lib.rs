mod command;
pub use command::{CommandCatalog, CommandInfo, CommandTemplate};

mod id;
pub use id::CommandId;

mod event;
pub use event::OutputEvent;

mod version;
pub use version::IpVersion;

pub mod config;
pub use config::{Config, DnsConfig, EndpointConfig, ListenConfig, RateLimitConfig, ServerInfo};

/// Opaque session identifier minted by the transport layer.
pub type SessionId = String;
