//! Contract Test: Unchanged IP short-circuits the cycle
//!
//! Constraints verified:
//! - An IP equal to the last-known IP makes no provider calls
//! - Repeated cycles with a stable IP stay silent towards the provider
//! - The last-known IP survives a restart when the file store is used
//!
//! If this test fails, the client is hitting the provider API on every poll.

mod common;

use common::*;
use dyndns_core::traits::{StateStore, LAST_KNOWN_IP_KEY};
use dyndns_core::{FileStateStore, ReconcileOutcome, Reconciler, StatePolicy};

#[tokio::test]
async fn unchanged_ip_makes_no_provider_calls() {
    let source = ScriptedIpSource::new(ip("1.2.3.4"));
    let provider = MockDnsProvider::new(zone("1.2.3.4"));
    let state = FlakyStateStore::new();
    state.set(LAST_KNOWN_IP_KEY, "1.2.3.4").await.unwrap();

    let reconciler = reconciler(&source, &provider, &state, StatePolicy::OnResolve);
    let outcome = reconciler.reconcile().await.expect("cycle succeeds");

    assert_eq!(outcome, ReconcileOutcome::Unchanged { ip: ip("1.2.3.4") });
    assert_eq!(source.call_count(), 1);
    assert_eq!(provider.list_call_count(), 0, "records must not be listed");
    assert_eq!(provider.update_call_count(), 0, "record must not be updated");
    assert_eq!(state.peek(LAST_KNOWN_IP_KEY).await.as_deref(), Some("1.2.3.4"));
}

#[tokio::test]
async fn stable_ip_over_many_cycles_lists_records_once() {
    let source = ScriptedIpSource::new(ip("5.6.7.8"));
    let provider = MockDnsProvider::new(zone("1.2.3.4"));
    let state = FlakyStateStore::new();

    let reconciler = reconciler(&source, &provider, &state, StatePolicy::OnResolve);

    let first = reconciler.run_cycle().await;
    assert!(matches!(
        first.outcome(),
        Some(ReconcileOutcome::Updated { .. })
    ));

    for _ in 0..5 {
        let report = reconciler.run_cycle().await;
        assert!(matches!(
            report.outcome(),
            Some(ReconcileOutcome::Unchanged { .. })
        ));
    }

    assert_eq!(source.call_count(), 6);
    assert_eq!(provider.list_call_count(), 1);
    assert_eq!(provider.update_call_count(), 1);
}

#[tokio::test]
async fn restart_with_file_store_skips_provider() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dyndns-state.json");

    let source = ScriptedIpSource::new(ip("5.6.7.8"));
    let provider = MockDnsProvider::new(zone("1.2.3.4"));

    // First process: updates the record and persists the IP
    {
        let store = FileStateStore::new(&path).await.unwrap();
        let reconciler = Reconciler::new(
            Box::new(source.clone()),
            Box::new(provider.clone()),
            Box::new(store),
            &config(StatePolicy::OnResolve),
        )
        .unwrap();

        let outcome = reconciler.reconcile().await.unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Updated { .. }));
        reconciler.shutdown().await.unwrap();
    }

    // Second process: same IP, nothing to do
    {
        let store = FileStateStore::new(&path).await.unwrap();
        let reconciler = Reconciler::new(
            Box::new(source.clone()),
            Box::new(provider.clone()),
            Box::new(store),
            &config(StatePolicy::OnResolve),
        )
        .unwrap();

        let outcome = reconciler.reconcile().await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Unchanged { ip: ip("5.6.7.8") });
    }

    assert_eq!(provider.list_call_count(), 1);
    assert_eq!(provider.update_call_count(), 1);
}
