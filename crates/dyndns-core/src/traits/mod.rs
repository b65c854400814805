//! Core traits for the dyndns client
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Resolve the current public IPv4 address
//! - [`DnsProvider`]: List and update DNS records via a provider API
//! - [`StateStore`]: Persist the last-known IP between cycles

pub mod ip_source;
pub mod dns_provider;
pub mod state_store;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, DnsRecord, RECORD_TYPE_A};
pub use state_store::{StateStore, StateEntry, LAST_KNOWN_IP_KEY};
