// # DigitalOcean DNS Provider
//
// This crate provides a DigitalOcean DNS provider implementation for the
// dyndns client.
//
// ## Scope
//
// - Lists every record of a domain (following pagination)
// - Rewrites the `data` field of one existing record
// - One logical API operation per call, no retry, no caching
// - Dry-run mode: lists normally, logs the update and skips the PUT
//
// Deciding *whether* to update is owned by the `Reconciler`.
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Pagination links are only followed when their scheme, host, port and
//   path prefix match the configured API base
//
// ## API Reference
//
// - DigitalOcean API v2: https://docs.digitalocean.com/reference/api/
// - List records: GET `/domains/:domain/records?per_page=200`
// - Update record: PUT `/domains/:domain/records/:id` with `{"data": "..."}`

use async_trait::async_trait;
use dyndns_core::config::ProviderConfig;
use dyndns_core::traits::{DnsProvider, DnsRecord};
use dyndns_core::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// Records requested per page
const PAGE_SIZE: &str = "200";

/// Upper bound on followed pagination links
const MAX_PAGES: usize = 50;

/// User-Agent sent with every request
const USER_AGENT: &str = concat!("dyndns/", env!("CARGO_PKG_VERSION"));

/// One page of `GET /domains/:domain/records`
#[derive(Debug, Deserialize)]
struct RecordsPage {
    domain_records: Vec<DnsRecord>,
    #[serde(default)]
    links: Option<Links>,
}

#[derive(Debug, Deserialize)]
struct Links {
    #[serde(default)]
    pages: Option<Pages>,
}

#[derive(Debug, Deserialize)]
struct Pages {
    #[serde(default)]
    next: Option<String>,
}

impl RecordsPage {
    fn next_page(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|links| links.pages.as_ref())
            .and_then(|pages| pages.next.as_deref())
    }
}

/// DigitalOcean DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests
/// - Log the intended PUT payload
/// - **NOT** modify the record, while still reporting success
pub struct DigitalOceanProvider {
    /// DigitalOcean API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL without trailing slash
    api_base: String,

    /// Parsed form of `api_base`, used to vet pagination links
    api_url: reqwest::Url,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for DigitalOceanProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitalOceanProvider")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl DigitalOceanProvider {
    /// Create a new DigitalOcean provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Personal access token with write scope
    /// - `config`: API base, timeout and dry-run settings
    ///
    /// Fails with `Error::Config` for an empty token or when the HTTP client
    /// cannot be built.
    pub fn new(api_token: impl Into<String>, config: &ProviderConfig) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(Error::config("DigitalOcean API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        if config.dry_run {
            tracing::warn!("DigitalOcean provider running in DRY-RUN mode - no changes will be made");
        }

        let api_base = config.api_base.trim_end_matches('/').to_string();
        let api_url = reqwest::Url::parse(&api_base).map_err(|e| {
            Error::config(format!("Invalid DigitalOcean API base '{}': {}", api_base, e))
        })?;

        Ok(Self {
            api_token,
            api_base,
            api_url,
            client,
            dry_run: config.dry_run,
        })
    }

    /// Whether updates are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self, domain: &str) -> String {
        format!("{}/domains/{}/records", self.api_base, domain)
    }

    fn record_url(&self, domain: &str, record_id: u64) -> String {
        format!("{}/domains/{}/records/{}", self.api_base, domain, record_id)
    }

    /// Whether `link` stays on the API origin and under its base path
    fn within_api_base(&self, link: &str) -> bool {
        let Ok(link) = reqwest::Url::parse(link) else {
            return false;
        };

        let base_path = self.api_url.path().trim_end_matches('/');
        link.scheme() == self.api_url.scheme()
            && link.host_str() == self.api_url.host_str()
            && link.port_or_known_default() == self.api_url.port_or_known_default()
            && (link.path() == base_path || link.path().starts_with(&format!("{}/", base_path)))
    }

    /// Fetch a single page of records
    async fn fetch_page(&self, url: &str, first: bool) -> Result<RecordsPage> {
        tracing::debug!("GET {}", url);

        let mut request = self.client.get(url).bearer_auth(&self.api_token);
        if first {
            request = request.query(&[("per_page", PAGE_SIZE)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error("list records", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body, "list records"));
        }

        let body = response.text().await.map_err(|e| {
            Error::network(format!("Failed to read DigitalOcean response: {}", e))
        })?;

        serde_json::from_str(&body).map_err(|e| {
            Error::parse(format!("Unexpected DigitalOcean records response: {}", e))
        })
    }
}

#[async_trait]
impl DnsProvider for DigitalOceanProvider {
    /// List all records of a domain
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /domains/example.com/records?per_page=200
    /// Authorization: Bearer <token>
    /// ```
    ///
    /// Further pages are fetched from `links.pages.next` until it is absent.
    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>> {
        let mut records = Vec::new();
        let mut url = self.records_url(domain);
        let mut first = true;

        for _ in 0..MAX_PAGES {
            let page = self.fetch_page(&url, first).await?;
            let next = page.next_page().map(str::to_string);
            records.extend(page.domain_records);

            let Some(next) = next else {
                tracing::debug!("Listed {} record(s) for {}", records.len(), domain);
                return Ok(records);
            };

            if !self.within_api_base(&next) {
                return Err(Error::parse(format!(
                    "Pagination link points outside the API base: {}",
                    next
                )));
            }

            url = next;
            first = false;
        }

        Err(Error::parse(format!(
            "Record listing for {} exceeded {} pages",
            domain, MAX_PAGES
        )))
    }

    /// Replace the value of an existing record
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /domains/example.com/records/42
    /// Authorization: Bearer <token>
    ///
    /// {"data": "203.0.113.7"}
    /// ```
    async fn update_record(&self, domain: &str, record_id: u64, data: &str) -> Result<()> {
        let url = self.record_url(domain, record_id);
        let payload = serde_json::json!({ "data": data });

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                payload
            );
            return Ok(());
        }

        tracing::debug!("PUT {}", url);

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error("update record", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body, "update record"));
        }

        tracing::info!("DNS record {} in {} set to {}", record_id, domain, data);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "digitalocean"
    }
}

fn transport_error(operation: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::network(format!("DigitalOcean {} timed out", operation))
    } else {
        Error::network(format!("DigitalOcean {} failed: {}", operation, err))
    }
}

/// Map a non-2xx status to a descriptive network error
fn status_error(status: reqwest::StatusCode, body: &str, operation: &str) -> Error {
    // DigitalOcean error bodies look like {"id": "not_found", "message": "..."}
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string());

    let message = match status.as_u16() {
        401 | 403 => format!(
            "Authentication failed: invalid API token or insufficient scope (HTTP {})",
            status
        ),
        404 => format!("Domain or record not found (HTTP {}): {}", status, detail),
        429 => format!("Rate limit exceeded, retry later (HTTP {})", status),
        500..=599 => format!(
            "DigitalOcean server error (transient) (HTTP {}): {}",
            status, detail
        ),
        _ => format!("HTTP {}: {}", status, detail),
    };

    Error::network(format!("DigitalOcean {}: {}", operation, message))
}
