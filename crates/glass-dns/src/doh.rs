use std::{net::IpAddr, time::Duration};

use async_trait::async_trait;
use reqwest::{StatusCode, Url, header::ACCEPT};
use serde::Deserialize;
use tracing::trace;

use crate::errors::DnsError;

const DNS_JSON: &str = "application/dns-json";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RecordType {
    A,
    Aaaa,
}

impl RecordType {
    /// Numeric RR type as it appears in the `Answer[].type` field.
    pub fn code(&self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::Aaaa => 28,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

/// Address of a DoH JSON endpoint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Endpoint {
    pub name: String,
    pub url: Url,
}

impl Endpoint {
    pub fn parse(name: impl Into<String>, url: &str) -> Result<Self, DnsError> {
        let parsed = Url::parse(url).map_err(|e| DnsError::InvalidEndpoint {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "https" | "http") {
            return Err(DnsError::InvalidEndpoint {
                url: url.to_string(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }
        Ok(Self {
            name: name.into(),
            url: parsed,
        })
    }
}

/// Transport for a single typed DoH query.
#[async_trait]
pub trait DohClient: Send + Sync + 'static {
    async fn query(
        &self,
        endpoint: &Endpoint,
        domain: &str,
        record: RecordType,
    ) -> Result<Vec<IpAddr>, DnsError>;
}

/// [`DohClient`] speaking the JSON flavour of DoH over `reqwest`.
pub struct HttpDohClient {
    http: reqwest::Client,
}

impl HttpDohClient {
    pub fn new(timeout: Duration) -> Result<Self, DnsError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(5)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl DohClient for HttpDohClient {
    async fn query(
        &self,
        endpoint: &Endpoint,
        domain: &str,
        record: RecordType,
    ) -> Result<Vec<IpAddr>, DnsError> {
        let url = Url::parse_with_params(
            endpoint.url.as_str(),
            &[("name", domain), ("type", record.as_str())],
        )
        .map_err(|e| DnsError::InvalidEndpoint {
            url: endpoint.url.to_string(),
            reason: e.to_string(),
        })?;

        trace!(target: "glass.dns", endpoint = %endpoint.name, %url, "doh query");
        let response = self.http.get(url).header(ACCEPT, DNS_JSON).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(DnsError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_answers(&body, record)
    }
}

#[derive(Deserialize)]
struct DohResponse {
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Deserialize)]
struct DohAnswer {
    data: String,
    #[serde(rename = "type")]
    kind: u16,
}

/// Extract the addresses of `record` type from a `application/dns-json` body.
///
/// Answers of other types (CNAME chains and the like) and unparsable data are skipped.
pub fn parse_answers(body: &str, record: RecordType) -> Result<Vec<IpAddr>, DnsError> {
    let response: DohResponse =
        serde_json::from_str(body).map_err(|e| DnsError::Decode(e.to_string()))?;

    Ok(response
        .answer
        .into_iter()
        .filter(|a| a.kind == record.code())
        .filter_map(|a| a.data.trim().parse::<IpAddr>().ok())
        .collect())
}
