use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Address family preference used when a domain target has to be resolved.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum IpVersion {
    /// Query both families; IPv4 wins when both answer.
    #[default]
    Auto,
    V4,
    V6,
}

impl IpVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            IpVersion::Auto => "auto",
            IpVersion::V4 => "ipv4",
            IpVersion::V6 => "ipv6",
        }
    }
}

impl FromStr for IpVersion {
    type Err = Infallible;

    /// Unknown values fall back to [`IpVersion::Auto`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        Ok(match norm.as_str() {
            "ipv4" | "v4" | "4" => IpVersion::V4,
            "ipv6" | "v6" | "6" => IpVersion::V6,
            _ => IpVersion::Auto,
        })
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for IpVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IpVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or_default())
    }
}
