// # DNS Provider Trait
//
// Defines the interface for reading and updating DNS records via a
// provider API.
//
// ## Implementations
//
// - DigitalOcean: `dyndns-provider-digitalocean` crate
//
// ## Usage
//
// ```rust,ignore
// use dyndns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> Result<(), Box<dyn std::error::Error>> {
//     let provider = /* DnsProvider implementation */;
//
//     let records = provider.list_records("example.com").await?;
//     if let Some(home) = records.iter().find(|r| r.is_a_record_named("home")) {
//         provider.update_record("example.com", home.id, "203.0.113.7").await?;
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Record type handled by the reconciler
pub const RECORD_TYPE_A: &str = "A";

/// A provider-side DNS record
///
/// Owned by the provider. The reconciler only ever rewrites `data` of an
/// existing A record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider record ID, used to address updates
    pub id: u64,
    /// Record name relative to the zone ("home", "www", "@")
    pub name: String,
    /// Record type ("A", "AAAA", "CNAME", ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record value; the IP address for A records
    pub data: String,
}

impl DnsRecord {
    /// Whether this is an A record with the given name
    pub fn is_a_record_named(&self, name: &str) -> bool {
        self.record_type == RECORD_TYPE_A && self.name == name
    }
}

/// Trait for DNS provider implementations
///
/// # Contract
///
/// - Single-shot: one logical API operation per call, no retry or backoff
/// - Stateless: nothing cached between calls
/// - Never creates or deletes records
/// - Never decides whether an update is needed (owned by the `Reconciler`)
/// - Never logs the API token
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every record in a domain
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<DnsRecord>)`: All records, across every page
    /// - `Err(Error::Network)`: Transport failure or non-2xx status
    /// - `Err(Error::Parse)`: Malformed response body
    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Replace the value of an existing record
    ///
    /// # Parameters
    ///
    /// - `domain`: The zone the record belongs to
    /// - `record_id`: Provider ID of the record
    /// - `data`: The new record value
    async fn update_record(
        &self,
        domain: &str,
        record_id: u64,
        data: &str,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
