//! Validation of user supplied targets.
//!
//! Accepted forms: `1.2.3.4`, `1.2.3.4:80`, `2001:db8::1`, `[2001:db8::1]:80`,
//! `example.com`, `example.com:443`.
use std::{fmt, net::IpAddr, str::FromStr, sync::LazyLock};

use regex::Regex;

use crate::error::ExecError;

const MAX_TARGET_LEN: usize = 256;

/// Labels of 1..=63 alphanumerics or hyphens, no hyphen at either end, alphabetic TLD.
static DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}$")
        .expect("domain pattern compiles")
});

/// A syntactically valid target: an IP literal or a domain, with an optional port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    host: String,
    port: Option<u16>,
    ip: Option<IpAddr>,
}

impl Target {
    pub fn parse(input: &str) -> Result<Self, ExecError> {
        let invalid = || ExecError::InvalidTarget(input.to_string());

        if input.len() > MAX_TARGET_LEN {
            return Err(invalid());
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let (host, port) = split_host_port(trimmed).ok_or_else(invalid)?;
        if host.is_empty() {
            return Err(invalid());
        }
        let port = match port {
            Some(p) if !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) => {
                Some(p.parse::<u16>().map_err(|_| invalid())?)
            }
            Some(_) => return Err(invalid()),
            None => None,
        };

        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(Self {
                host: host.to_string(),
                port,
                ip: Some(ip),
            });
        }
        if DOMAIN.is_match(host) {
            return Ok(Self {
                host: host.to_ascii_lowercase(),
                port,
                ip: None,
            });
        }
        Err(invalid())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The literal address, if the host is not a domain.
    pub fn ip(&self) -> Option<IpAddr> {
        self.ip
    }

    pub fn is_domain(&self) -> bool {
        self.ip.is_none()
    }

    /// Format `ip` with this target's port, bracketing IPv6 when a port is present.
    pub fn with_ip(&self, ip: IpAddr) -> String {
        match (ip, self.port) {
            (IpAddr::V6(v6), Some(port)) => format!("[{v6}]:{port}"),
            (ip, Some(port)) => format!("{ip}:{port}"),
            (ip, None) => ip.to_string(),
        }
    }
}

impl FromStr for Target {
    type Err = ExecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ip, self.port) {
            (Some(ip), _) => f.write_str(&self.with_ip(ip)),
            (None, Some(port)) => write!(f, "{}:{port}", self.host),
            (None, None) => f.write_str(&self.host),
        }
    }
}

/// Split `input` into host and optional port. `None` means the shape itself is invalid.
fn split_host_port(input: &str) -> Option<(&str, Option<&str>)> {
    if let Some(rest) = input.strip_prefix('[') {
        let close = rest.find(']')?;
        let host = &rest[..close];
        // brackets are only meaningful around IPv6 literals
        if !host.contains(':') {
            return None;
        }
        let after = &rest[close + 1..];
        return match after {
            "" => Some((host, None)),
            _ => Some((host, Some(after.strip_prefix(':')?))),
        };
    }

    if !input.contains(':') {
        return Some((input, None));
    }
    // bare IPv6 without port
    if input.parse::<IpAddr>().is_ok() {
        return Some((input, None));
    }
    let (host, port) = input.rsplit_once(':')?;
    if host.contains(':') {
        return None;
    }
    Some((host, Some(port)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(s: &str) -> Target {
        Target::parse(s).unwrap_or_else(|e| panic!("{s}: {e}"))
    }

    fn bad(s: &str) {
        assert!(
            matches!(Target::parse(s), Err(ExecError::InvalidTarget(_))),
            "{s} should be rejected"
        );
    }

    #[test]
    fn ipv4_with_and_without_port() {
        let t = ok("192.0.2.1");
        assert_eq!(t.ip(), Some("192.0.2.1".parse().unwrap()));
        assert_eq!(t.port(), None);

        let t = ok("192.0.2.1:8080");
        assert_eq!(t.port(), Some(8080));
        assert_eq!(t.to_string(), "192.0.2.1:8080");
    }

    #[test]
    fn ipv6_forms() {
        let bare = ok("2001:db8::1");
        assert!(!bare.is_domain());
        assert_eq!(bare.port(), None);

        let bracketed = ok("[2001:db8::1]:443");
        assert_eq!(bracketed.host(), "2001:db8::1");
        assert_eq!(bracketed.port(), Some(443));
        assert_eq!(bracketed.to_string(), "[2001:db8::1]:443");

        let no_port = ok("[2001:db8::1]");
        assert_eq!(no_port.port(), None);
    }

    #[test]
    fn domains() {
        let t = ok("Example.COM");
        assert!(t.is_domain());
        assert_eq!(t.host(), "example.com");

        assert_eq!(ok(&format!("{}.com", "a".repeat(63))).host().len(), 67);

        let t = ok("a-b.sub.example.org:53");
        assert_eq!(t.host(), "a-b.sub.example.org");
        assert_eq!(t.port(), Some(53));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(ok("  1.1.1.1 ").host(), "1.1.1.1");
    }

    #[test]
    fn rejects_garbage() {
        bad("");
        bad("   ");
        bad("localhost");
        bad("example.c0m");
        bad("-bad.example.com");
        bad("bad-.example.com");
        bad("exa mple.com");
        bad("example.com:");
        bad("example.com:http");
        bad("example.com:99999");
        bad("1.1.1.1; rm -rf /");
        bad("$(reboot).example.com");
        bad("[2001:db8::1");
        bad("[2001:db8::1]8080");
        bad("[example.com]:80");
        bad("2001:db8::zz");
        bad(&format!("{}.com", "a".repeat(64)));
        bad(&format!("{}.com", "a.".repeat(140)));
        bad("example..com");
        bad(".example.com");
        bad("example.com.");
    }

    #[test]
    fn with_ip_reattaches_port() {
        let t = ok("example.com:8080");
        assert_eq!(t.with_ip("2001:db8::1".parse().unwrap()), "[2001:db8::1]:8080");
        assert_eq!(t.with_ip("192.0.2.1".parse().unwrap()), "192.0.2.1:8080");

        let t = ok("example.com");
        assert_eq!(t.with_ip("2001:db8::1".parse().unwrap()), "2001:db8::1");
    }
}
