//! DNS-over-HTTPS resolution with latency-ranked endpoints.
//!
//! A [`DnsResolver`] owns a fixed list of DoH endpoints. A background prober measures each
//! endpoint periodically and marks the fastest one as current. Resolution asks the current
//! endpoint first, then races the others, and finally falls back to the platform resolver.
mod errors;
pub use errors::DnsError;

mod doh;
pub use doh::{DohClient, Endpoint, HttpDohClient, RecordType, parse_answers};

mod system;
pub use system::{SystemResolver, TokioSystemResolver};

mod resolver;
pub use resolver::{DnsResolver, EndpointStatus};

use std::net::IpAddr;

use async_trait::async_trait;
use glass_model::IpVersion;

/// Anything that can turn a domain into addresses.
///
/// The launcher depends on this rather than on [`DnsResolver`] directly.
#[async_trait]
pub trait Resolve: Send + Sync + 'static {
    async fn resolve(&self, domain: &str, version: IpVersion) -> Result<Vec<IpAddr>, DnsError>;
}
