//! Reconciliation cycle
//!
//! The [`Reconciler`] runs one cycle per call:
//! - Resolving the current public IP via IpSource
//! - Comparing it with the last-known IP from the StateStore
//! - Looking up the target A record via DnsProvider when the IP moved
//! - Updating that record only when the provider value is stale
//!
//! ## Cycle
//!
//! ```text
//! Start → ResolveIP ──fail──▶ Abort (state untouched)
//!            │
//!            ▼
//!        PersistIP            (StatePolicy::OnResolve)
//!            │
//!            ▼
//!      CompareLocal ──equal──▶ Unchanged
//!            │
//!            ▼
//!      FetchRecords ──fail──▶ Abort
//!            │
//!            ▼
//!      LocateRecord ──missing──▶ RecordNotFound
//!            │
//!            ▼
//!     CompareRemote ──equal──▶ AlreadyCurrent
//!            │
//!            ▼
//!      UpdateRecord ──fail──▶ Abort
//!            │
//!            ▼
//!         Updated
//! ```
//!
//! The reconciler owns no timer. Callers invoke [`Reconciler::run_cycle`]
//! once or from their own loop, and must not overlap calls.

use crate::config::{DynDnsConfig, StatePolicy};
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsRecord, IpSource, StateStore, LAST_KNOWN_IP_KEY};
use std::fmt;
use std::net::Ipv4Addr;
use tracing::{debug, error, info, warn};

/// Record name checked as a secondary reference point
const REFERENCE_RECORD_NAME: &str = "www";

/// Result of a successful cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The resolved IP matches the last-known IP; no DNS calls were made
    Unchanged {
        /// Current public IP
        ip: Ipv4Addr,
    },

    /// The IP moved, but the provider record already holds it
    AlreadyCurrent {
        /// Fully qualified record name
        record_name: String,
        /// Provider record ID
        record_id: u64,
        /// Current public IP
        ip: Ipv4Addr,
    },

    /// The provider record was rewritten
    Updated {
        /// Fully qualified record name
        record_name: String,
        /// Provider record ID
        record_id: u64,
        /// Record value before the update
        previous: String,
        /// Value written
        ip: Ipv4Addr,
    },
}

impl ReconcileOutcome {
    /// The public IP observed during the cycle
    pub fn ip(&self) -> Ipv4Addr {
        match self {
            Self::Unchanged { ip } | Self::AlreadyCurrent { ip, .. } | Self::Updated { ip, .. } => {
                *ip
            }
        }
    }
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged { ip } => {
                write!(f, "unchanged: IP address is still {}, nothing to do", ip)
            }
            Self::AlreadyCurrent {
                record_name, ip, ..
            } => write!(
                f,
                "already current: IP changed to {} and {} already points there",
                ip, record_name
            ),
            Self::Updated {
                record_name,
                record_id,
                previous,
                ip,
            } => write!(
                f,
                "updated: {} (id {}) {} -> {}",
                record_name, record_id, previous, ip
            ),
        }
    }
}

/// What a cycle reports to its caller
///
/// Errors never escape a cycle; they are captured here so a scheduler can
/// keep running.
#[derive(Debug)]
pub enum CycleReport {
    /// The cycle reached a terminal state
    Completed(ReconcileOutcome),
    /// The cycle was aborted
    Failed(Error),
}

impl CycleReport {
    /// Whether the cycle completed
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// The outcome, if the cycle completed
    pub fn outcome(&self) -> Option<&ReconcileOutcome> {
        match self {
            Self::Completed(outcome) => Some(outcome),
            Self::Failed(_) => None,
        }
    }

    /// The error, if the cycle failed
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Completed(_) => None,
            Self::Failed(err) => Some(err),
        }
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(outcome) => write!(f, "{}", outcome),
            Self::Failed(err) => write!(f, "error: {}", err),
        }
    }
}

/// Single-record reconciler
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Call [`Reconciler::run_cycle()`] once, or on a timer owned by the caller
/// 3. Call [`Reconciler::shutdown()`] to flush the state store
///
/// Between calls the reconciler holds no state of its own; everything that
/// survives a cycle lives in the state store under [`LAST_KNOWN_IP_KEY`].
pub struct Reconciler {
    /// IP source for the current public address
    ip_source: Box<dyn IpSource>,

    /// DNS provider for record lookups and updates
    provider: Box<dyn DnsProvider>,

    /// State store for the last-known IP
    state_store: Box<dyn StateStore>,

    /// Zone to manage
    domain_name: String,

    /// Record name inside the zone
    subdomain_name: String,

    /// When the resolved IP is persisted
    state_policy: StatePolicy,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `state_store`: State store implementation
    /// - `config`: Configuration; validated here
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        state_store: Box<dyn StateStore>,
        config: &DynDnsConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            ip_source,
            provider,
            state_store,
            domain_name: config.domain_name.clone(),
            subdomain_name: config.subdomain_name.clone(),
            state_policy: config.state_policy,
        })
    }

    /// Fully qualified name of the target record
    pub fn record_fqdn(&self) -> String {
        if self.subdomain_name == "@" {
            self.domain_name.clone()
        } else {
            format!("{}.{}", self.subdomain_name, self.domain_name)
        }
    }

    /// Run one cycle and report its result
    ///
    /// Logs one status line per cycle. Never returns an error.
    pub async fn run_cycle(&self) -> CycleReport {
        debug!("Starting reconciliation cycle for {}", self.record_fqdn());

        let report = match self.reconcile().await {
            Ok(outcome) => CycleReport::Completed(outcome),
            Err(err) => CycleReport::Failed(err),
        };

        match &report {
            CycleReport::Completed(_) => info!("{}", report),
            CycleReport::Failed(err) if err.is_transient() => {
                warn!("{} (will try again next cycle)", report)
            }
            CycleReport::Failed(_) => error!("{}", report),
        }

        report
    }

    /// Run one cycle, returning the first error encountered
    ///
    /// # Returns
    ///
    /// - `Ok(ReconcileOutcome)`: The cycle reached a terminal state
    /// - `Err(Error::Network | Error::Parse)`: An outbound call failed
    /// - `Err(Error::RecordNotFound)`: The zone has no matching A record
    pub async fn reconcile(&self) -> Result<ReconcileOutcome> {
        let last_known_ip = self.load_last_known_ip().await;

        let current_ip = match self.ip_source.current().await {
            Ok(ip) => ip,
            Err(e) => {
                warn!(
                    "Could not resolve public IP via {}: {}",
                    self.ip_source.source_name(),
                    e
                );
                return Err(e);
            }
        };
        let current = current_ip.to_string();
        info!("Current IP address is {}", current);

        if self.state_policy == StatePolicy::OnResolve {
            self.persist_ip(&current).await;
        }

        if current == last_known_ip {
            debug!("IP address has not changed since last check");
            return Ok(self
                .published(ReconcileOutcome::Unchanged { ip: current_ip })
                .await);
        }

        info!(
            "IP address changed since last check ({} -> {})",
            display_ip(&last_known_ip),
            current
        );

        let records = self.provider.list_records(&self.domain_name).await?;
        debug!(
            "Fetched {} record(s) for {} from {}",
            records.len(),
            self.domain_name,
            self.provider.provider_name()
        );

        let target = self.locate_target(&records, &current)?;
        let record_name = self.record_fqdn();

        if target.data == current {
            info!(
                "{} already resolves to {}, no update needed",
                record_name, current
            );
            return Ok(self
                .published(ReconcileOutcome::AlreadyCurrent {
                    record_name,
                    record_id: target.id,
                    ip: current_ip,
                })
                .await);
        }

        info!(
            "Updating {} (id {}) from {} to {}",
            record_name, target.id, target.data, current
        );
        self.provider
            .update_record(&self.domain_name, target.id, &current)
            .await?;

        Ok(self
            .published(ReconcileOutcome::Updated {
                record_name,
                record_id: target.id,
                previous: target.data.clone(),
                ip: current_ip,
            })
            .await)
    }

    /// Flush the state store
    pub async fn shutdown(&self) -> Result<()> {
        self.state_store.flush().await?;
        info!("State flushed, reconciler stopped");
        Ok(())
    }

    /// Read the last-known IP; absence or a read failure yields ""
    async fn load_last_known_ip(&self) -> String {
        match self.state_store.get_entry(LAST_KNOWN_IP_KEY).await {
            Ok(Some(entry)) => {
                debug!(
                    "Last known IP address is {} (recorded {}s ago)",
                    display_ip(&entry.value),
                    entry.age().num_seconds()
                );
                entry.value
            }
            Ok(None) => {
                debug!("No last known IP address recorded yet");
                String::new()
            }
            Err(e) => {
                warn!("Could not read last known IP, treating as empty: {}", e);
                String::new()
            }
        }
    }

    /// Write the IP to the state store; failures are logged, not returned
    async fn persist_ip(&self, ip: &str) {
        if let Err(e) = self.state_store.set(LAST_KNOWN_IP_KEY, ip).await {
            warn!("Could not persist last known IP {}: {}", ip, e);
        }
    }

    /// Persist under `OnPublish` now that the provider is known to hold the IP
    async fn published(&self, outcome: ReconcileOutcome) -> ReconcileOutcome {
        if self.state_policy == StatePolicy::OnPublish {
            self.persist_ip(&outcome.ip().to_string()).await;
        }
        outcome
    }

    /// Find the A record for the configured subdomain
    fn locate_target<'a>(&self, records: &'a [DnsRecord], current: &str) -> Result<&'a DnsRecord> {
        if let Some(reference) = records
            .iter()
            .find(|r| r.is_a_record_named(REFERENCE_RECORD_NAME))
        {
            if reference.data == current {
                info!(
                    "Current IP matches the {} record of {}",
                    REFERENCE_RECORD_NAME, self.domain_name
                );
            } else {
                debug!(
                    "{} record of {} resolves to {}",
                    REFERENCE_RECORD_NAME, self.domain_name, reference.data
                );
            }
        }

        records
            .iter()
            .find(|r| r.is_a_record_named(&self.subdomain_name))
            .ok_or_else(|| Error::record_not_found(&self.subdomain_name, &self.domain_name))
    }
}

fn display_ip(ip: &str) -> &str {
    if ip.is_empty() { "<none>" } else { ip }
}
