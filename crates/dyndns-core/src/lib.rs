// # dyndns-core
//
// Core library for the single-record dynamic DNS client.
//
// ## Architecture Overview
//
// This library provides the core functionality for dynamic DNS updates:
// - **IpSource**: Trait for resolving the current public IPv4 address
// - **DnsProvider**: Trait for listing and updating DNS records via a provider API
// - **StateStore**: Trait for persisting the last-known IP between cycles
// - **Reconciler**: Runs one resolve → compare → update cycle per call
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from HTTP implementations
// 2. **Caller-Owned Scheduling**: The core never sleeps or spawns timers
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Idempotency**: The record is only written when its value is stale

pub mod traits;
pub mod reconciler;
pub mod config;
pub mod error;
pub mod state;

// Re-export core types for convenience
pub use traits::{DnsProvider, DnsRecord, IpSource, StateStore};
pub use reconciler::{CycleReport, ReconcileOutcome, Reconciler};
pub use config::{DynDnsConfig, IpSourceConfig, ProviderConfig, StatePolicy, StateStoreConfig};
pub use error::{Error, Result};
pub use state::{FileStateStore, MemoryStateStore};
