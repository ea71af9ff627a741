use std::net::IpAddr;

use async_trait::async_trait;

use crate::errors::DnsError;

/// Last-resort lookup through the platform resolver.
#[async_trait]
pub trait SystemResolver: Send + Sync + 'static {
    async fn lookup(&self, domain: &str) -> Result<Vec<IpAddr>, DnsError>;
}

/// Uses `getaddrinfo` via [`tokio::net::lookup_host`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSystemResolver;

#[async_trait]
impl SystemResolver for TokioSystemResolver {
    async fn lookup(&self, domain: &str) -> Result<Vec<IpAddr>, DnsError> {
        let addrs = tokio::net::lookup_host((domain, 0))
            .await
            .map_err(|e| DnsError::System(e.to_string()))?;

        let mut ips: Vec<IpAddr> = Vec::new();
        for addr in addrs {
            if !ips.contains(&addr.ip()) {
                ips.push(addr.ip());
            }
        }
        Ok(ips)
    }
}
