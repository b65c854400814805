//! Cycle scheduling
//!
//! The reconciler owns no timer; this module decides when cycles run and
//! makes sure they never overlap.

use anyhow::Result;
use dyndns_core::{CycleReport, Reconciler};
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Run a single cycle and flush state
pub async fn run_once(reconciler: &Reconciler) -> CycleReport {
    let report = reconciler.run_cycle().await;

    if let Err(e) = reconciler.shutdown().await {
        warn!("Failed to flush state: {}", e);
    }

    report
}

/// Run a cycle now and then once per `period` until `shutdown` resolves
///
/// Each cycle is awaited inside the loop, so a slow cycle delays the next
/// tick instead of overlapping with it. Returns the number of cycles run.
pub async fn run_every<F>(reconciler: &Reconciler, period: Duration, shutdown: F) -> Result<u64>
where
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut cycles = 0u64;
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                reconciler.run_cycle().await;
                cycles += 1;
                info!("Sleeping for {} seconds", period.as_secs());
            }
        }
    }

    info!("Stopping after {} cycle(s)", cycles);
    reconciler.shutdown().await?;
    Ok(cycles)
}

/// Wait for SIGTERM or SIGINT
///
/// Handlers are installed before this returns, so a setup failure is
/// reported at startup rather than on first signal.
#[cfg(unix)]
pub fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
pub fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to wait for CTRL-C: {}", e);
        }
        "CTRL-C"
    })
}
