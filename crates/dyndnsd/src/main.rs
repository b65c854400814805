// # dyndnsd - dyndns Daemon
//
// This is a thin integration layer. All reconciliation logic lives in
// dyndns-core; this binary only:
// 1. Parses the command line and loads the configuration file
// 2. Initializes logging and the tokio runtime
// 3. Builds the IP source, DNS provider and state store
// 4. Runs cycles once or on an interval until SIGTERM/SIGINT
//
// ## Configuration
//
// Flags (each also readable from a `DYNDNS_*` environment variable):
//
// - `-d, --domain`: Domain managed at DigitalOcean
// - `-s, --subdomain`: Record name inside the domain
// - `-a, --auth-token`: DigitalOcean API token
// - `-r, --repeat`: Seconds between checks
// - `-o, --once`: Run a single check
// - `-c, --config`: Configuration file (default `./dyndns.json`)
// - `-m, --memory`: Do not keep a state file
// - `--state-file`, `--state-policy`, `--dry-run`, `--log-level`
//
// ## Example
//
// ```bash
// dyndnsd -d example.com -s home -a "$DO_TOKEN" -r 3600
// ```

mod cli;
mod schedule;
mod settings;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use dyndns_core::{DynDnsConfig, Reconciler};
use dyndns_ip_http::HttpIpSource;
use dyndns_provider_digitalocean::DigitalOceanProvider;
use settings::{RunMode, Settings, Startup};
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions, plus one for first-run setup:
/// - 0: Clean shutdown, or a successful single check
/// - 1: Configuration or startup error
/// - 2: Runtime error, or a failed single check
/// - 10: Configuration template written, edit it and start again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DynDnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (failed cycle in single-shot mode)
    RuntimeError = 2,
    /// A configuration template was created
    ConfigTemplateCreated = 10,
}

impl From<DynDnsExitCode> for ExitCode {
    fn from(code: DynDnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::from(cli.log_level))
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DynDnsExitCode::ConfigError.into();
    }

    info!("dyndns v{} starting", env!("CARGO_PKG_VERSION"));

    let settings = match settings::resolve(&cli) {
        Ok(Startup::Run(settings)) => settings,
        Ok(Startup::TemplateCreated(path)) => {
            warn!("Configuration file not found, created {}", path.display());
            warn!("Edit it with your domain, subdomain and API token, then start again");
            return DynDnsExitCode::ConfigTemplateCreated.into();
        }
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return DynDnsExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DynDnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(settings)).into()
}

/// Build the components and run cycles according to the run mode
async fn run_daemon(settings: Settings) -> DynDnsExitCode {
    let reconciler = match build_reconciler(&settings.config).await {
        Ok(reconciler) => reconciler,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            return DynDnsExitCode::ConfigError;
        }
    };

    info!("Managing A record {}", reconciler.record_fqdn());

    match settings.mode {
        RunMode::Once => {
            info!("Running once");
            let report = schedule::run_once(&reconciler).await;
            if report.is_success() {
                DynDnsExitCode::CleanShutdown
            } else {
                DynDnsExitCode::RuntimeError
            }
        }
        RunMode::Every(period) => {
            info!("Checking every {} seconds", period.as_secs());

            let signal = match schedule::shutdown_signal() {
                Ok(signal) => signal,
                Err(e) => {
                    error!("{}", e);
                    return DynDnsExitCode::RuntimeError;
                }
            };
            let shutdown = async {
                let name = signal.await;
                info!("Received shutdown signal: {}", name);
            };

            match schedule::run_every(&reconciler, period, shutdown).await {
                Ok(_) => {
                    info!("Shutting down daemon");
                    DynDnsExitCode::CleanShutdown
                }
                Err(e) => {
                    error!("Shutdown error: {}", e);
                    DynDnsExitCode::RuntimeError
                }
            }
        }
    }
}

/// Wire the HTTP IP source, DigitalOcean provider and state store together
async fn build_reconciler(config: &DynDnsConfig) -> Result<Reconciler> {
    let ip_source = HttpIpSource::new(&config.ip_source)?;
    let provider = DigitalOceanProvider::new(config.auth_token.clone(), &config.provider)?;
    let state_store = dyndns_core::state::open(&config.state_store).await?;

    info!(
        "IP source: {}, provider: {}, state policy: {:?}",
        ip_source.url(),
        dyndns_core::DnsProvider::provider_name(&provider),
        config.state_policy
    );

    Ok(Reconciler::new(
        Box::new(ip_source),
        Box::new(provider),
        state_store,
        config,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(DynDnsExitCode::CleanShutdown as u8, 0);
        assert_eq!(DynDnsExitCode::ConfigError as u8, 1);
        assert_eq!(DynDnsExitCode::RuntimeError as u8, 2);
        assert_eq!(DynDnsExitCode::ConfigTemplateCreated as u8, 10);
    }

    #[tokio::test]
    async fn test_build_reconciler_from_config() {
        let config = DynDnsConfig::new("example.com", "home", "token");
        let reconciler = build_reconciler(&config).await.unwrap();
        assert_eq!(reconciler.record_fqdn(), "home.example.com");
    }

    #[tokio::test]
    async fn test_build_reconciler_rejects_placeholder_config() {
        let config = DynDnsConfig::template();
        assert!(build_reconciler(&config).await.is_err());
    }
}
