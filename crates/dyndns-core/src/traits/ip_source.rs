// # IP Source Trait
//
// Defines the interface for resolving the caller's current public IPv4
// address.
//
// ## Implementations
//
// - HTTP IP-echo service: `dyndns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use dyndns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> Result<(), Box<dyn std::error::Error>> {
//     let source = /* IpSource implementation */;
//
//     let current_ip = source.current().await?;
//     println!("public IP: {}", current_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for IP source implementations
///
/// # Contract
///
/// - One read-only lookup per call, no caching between calls
/// - No retry: a failed lookup is returned to the reconciler, which skips
///   the rest of the cycle
/// - No side effects
///
/// Errors are [`Error::Network`](crate::Error::Network) for transport
/// failures and non-2xx responses, and [`Error::Parse`](crate::Error::Parse)
/// for a body that is not the expected shape.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Resolve the current public IPv4 address
    async fn current(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Short name for logging (e.g. the service host)
    fn source_name(&self) -> &str;
}
