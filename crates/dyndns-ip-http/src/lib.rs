// # HTTP IP Source
//
// This crate provides an HTTP-based IP source for the dyndns client.
//
// ## Purpose
//
// Resolves the public IPv4 address by asking an IP-echo service that
// answers with a JSON body:
//
// ```json
// {"ip": "203.0.113.7"}
// ```
//
// The default service is ipify (`https://api.ipify.org?format=json`); any
// endpoint returning the same shape can be configured.
//
// ## Architecture
//
// One GET per `current()` call. No caching, no retries, no polling loop:
// scheduling belongs to the caller.

use dyndns_core::config::IpSourceConfig;
use dyndns_core::traits::IpSource;
use dyndns_core::{Error, Result};

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// User-Agent sent with every request
const USER_AGENT: &str = concat!("dyndns/", env!("CARGO_PKG_VERSION"));

/// Body returned by the IP-echo service
#[derive(Debug, Deserialize)]
struct IpEchoResponse {
    ip: String,
}

/// HTTP IP-echo source
pub struct HttpIpSource {
    /// URL to fetch the IP from
    url: String,

    /// Host part of the URL, for logging
    host: String,

    /// Per-request timeout, kept for error messages
    timeout: Duration,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source from configuration
    ///
    /// Fails with `Error::Config` if the URL does not parse or the HTTP
    /// client cannot be built.
    pub fn new(config: &IpSourceConfig) -> Result<Self> {
        let parsed = reqwest::Url::parse(&config.url).map_err(|e| {
            Error::config(format!("Invalid IP source URL '{}': {}", config.url, e))
        })?;
        let host = parsed.host_str().unwrap_or("unknown").to_string();

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: config.url.clone(),
            host,
            timeout,
            client,
        })
    }

    /// The configured URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the current IP from the echo service
    async fn fetch_ip(&self) -> Result<Ipv4Addr> {
        tracing::debug!("Querying {} for public IP", self.url);

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::network(format!(
                    "Request to {} timed out after {}s",
                    self.host,
                    self.timeout.as_secs()
                ))
            } else {
                Error::network(format!("Request to {} failed: {}", self.host, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!(
                "{} returned HTTP {}",
                self.host, status
            )));
        }

        let body = response.text().await.map_err(|e| {
            Error::network(format!("Failed to read response from {}: {}", self.host, e))
        })?;

        parse_echo_body(&body)
    }
}

/// Extract an IPv4 address from an IP-echo JSON body
fn parse_echo_body(body: &str) -> Result<Ipv4Addr> {
    let echo: IpEchoResponse = serde_json::from_str(body)
        .map_err(|e| Error::parse(format!("Unexpected IP echo response: {}", e)))?;

    let text = echo.ip.trim();
    match text.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => Ok(ip),
        Ok(IpAddr::V6(ip)) => Err(Error::parse(format!(
            "Expected an IPv4 address, got IPv6 {}",
            ip
        ))),
        Err(_) => Err(Error::parse(format!("Invalid IP address: '{}'", text))),
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        let ip = self.fetch_ip().await?;
        tracing::debug!("{} reports public IP {}", self.host, ip);
        Ok(ip)
    }

    fn source_name(&self) -> &str {
        &self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_name_is_host() {
        let source = HttpIpSource::new(&IpSourceConfig::default()).unwrap();
        assert_eq!(source.source_name(), "api.ipify.org");
        assert_eq!(source.url(), "https://api.ipify.org?format=json");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = IpSourceConfig {
            url: "not a url".to_string(),
            timeout_secs: 10,
        };
        assert!(matches!(HttpIpSource::new(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_echo_body() {
        assert_eq!(
            parse_echo_body(r#"{"ip":"203.0.113.7"}"#).unwrap(),
            Ipv4Addr::new(203, 0, 113, 7)
        );
        assert_eq!(
            parse_echo_body(r#"{"ip":" 203.0.113.7\n","country":"NL"}"#).unwrap(),
            Ipv4Addr::new(203, 0, 113, 7)
        );
    }

    #[test]
    fn test_parse_echo_body_rejects_bad_shapes() {
        for body in [
            "203.0.113.7",
            r#"{"address":"203.0.113.7"}"#,
            r#"{"ip":"not-an-ip"}"#,
            r#"{"ip":"2001:db8::1"}"#,
            "",
        ] {
            assert!(
                matches!(parse_echo_body(body), Err(Error::Parse(_))),
                "body {:?} should be a parse error",
                body
            );
        }
    }
}
