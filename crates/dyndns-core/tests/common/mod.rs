//! Test doubles and common utilities for reconciliation contract tests
//!
//! Every double is `Clone` and shares its counters through `Arc`, so a test
//! can hand one copy to the reconciler and keep another for assertions.

#![allow(dead_code)]

use dyndns_core::error::{Error, Result};
use dyndns_core::traits::{DnsProvider, DnsRecord, IpSource, StateEntry, StateStore};
use dyndns_core::{DynDnsConfig, MemoryStateStore, Reconciler, StatePolicy};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const DOMAIN: &str = "example.com";
pub const SUBDOMAIN: &str = "home";

/// An IpSource whose answer the test controls
///
/// `None` makes `current()` fail with a network error.
#[derive(Clone)]
pub struct ScriptedIpSource {
    ip: Arc<Mutex<Option<Ipv4Addr>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            ip: Arc::new(Mutex::new(Some(ip))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            ip: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Change the IP returned by subsequent calls
    pub fn set_ip(&self, ip: Option<Ipv4Addr>) {
        *self.ip.lock().unwrap() = ip;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let ip = *self.ip.lock().unwrap();
        ip.ok_or_else(|| Error::network("ip echo service unreachable"))
    }

    fn source_name(&self) -> &str {
        "scripted"
    }
}

/// A DnsProvider backed by an in-memory zone
///
/// Successful updates rewrite the stored record, like a real provider.
#[derive(Clone)]
pub struct MockDnsProvider {
    records: Arc<Mutex<Vec<DnsRecord>>>,
    list_calls: Arc<AtomicUsize>,
    updates: Arc<Mutex<Vec<(String, u64, String)>>>,
    fail_list: Arc<AtomicBool>,
    fail_update: Arc<AtomicBool>,
}

impl MockDnsProvider {
    pub fn new(records: Vec<DnsRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            list_calls: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(Mutex::new(Vec::new())),
            fail_list: Arc::new(AtomicBool::new(false)),
            fail_update: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn update_call_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// Every update attempt as (domain, record id, data)
    pub fn updates(&self) -> Vec<(String, u64, String)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn record_data(&self, id: u64) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.data.clone())
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_update(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(domain, DOMAIN, "provider queried for the wrong zone");

        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Error::network("HTTP 503 Service Unavailable"));
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn update_record(&self, domain: &str, record_id: u64, data: &str) -> Result<()> {
        self.updates
            .lock()
            .unwrap()
            .push((domain.to_string(), record_id, data.to_string()));

        if self.fail_update.load(Ordering::SeqCst) {
            return Err(Error::network("HTTP 500 Internal Server Error"));
        }

        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.iter_mut().find(|r| r.id == record_id) {
            record.data = data.to_string();
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A StateStore that can be told to fail reads or writes
#[derive(Clone, Default)]
pub struct FlakyStateStore {
    inner: MemoryStateStore,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl FlakyStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Read the stored value without going through the failure switch
    pub async fn peek(&self, key: &str) -> Option<String> {
        self.inner.get(key).await.unwrap()
    }
}

#[async_trait::async_trait]
impl StateStore for FlakyStateStore {
    async fn get_entry(&self, key: &str) -> Result<Option<StateEntry>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::persistence("state file unreadable"));
        }
        self.inner.get_entry(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::persistence("disk full"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }

    async fn flush(&self) -> Result<()> {
        self.inner.flush().await
    }
}

/// An A record in the test zone
pub fn a_record(id: u64, name: &str, data: &str) -> DnsRecord {
    DnsRecord {
        id,
        name: name.to_string(),
        record_type: "A".to_string(),
        data: data.to_string(),
    }
}

/// Zone with the target record, a www record and some unrelated entries
pub fn zone(home_ip: &str) -> Vec<DnsRecord> {
    vec![
        DnsRecord {
            id: 1,
            name: "@".to_string(),
            record_type: "NS".to_string(),
            data: "ns1.digitalocean.com".to_string(),
        },
        a_record(2, "www", "198.51.100.10"),
        DnsRecord {
            id: 3,
            name: SUBDOMAIN.to_string(),
            record_type: "AAAA".to_string(),
            data: "2001:db8::1".to_string(),
        },
        a_record(42, SUBDOMAIN, home_ip),
    ]
}

pub fn config(policy: StatePolicy) -> DynDnsConfig {
    DynDnsConfig::new(DOMAIN, SUBDOMAIN, "test-token").with_state_policy(policy)
}

pub fn reconciler(
    ip_source: &ScriptedIpSource,
    provider: &MockDnsProvider,
    state: &FlakyStateStore,
    policy: StatePolicy,
) -> Reconciler {
    Reconciler::new(
        Box::new(ip_source.clone()),
        Box::new(provider.clone()),
        Box::new(state.clone()),
        &config(policy),
    )
    .expect("test config is valid")
}

pub fn ip(s: &str) -> Ipv4Addr {
    s.parse().expect("valid test IP")
}
