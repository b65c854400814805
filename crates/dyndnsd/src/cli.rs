//! Command-line arguments using clap.
//!
//! Every value option can also come from a `DYNDNS_*` environment variable.

use clap::{Parser, ValueEnum};
use dyndns_core::StatePolicy;
use std::path::PathBuf;
use tracing::Level;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "./dyndns.json";

/// Keep a DigitalOcean A record pointed at this machine's public IPv4 address
///
/// With domain, subdomain and token given on the command line together with
/// --once or --repeat, no configuration file is read. Otherwise the
/// configuration file is loaded, and created with placeholder values if it
/// does not exist yet.
#[derive(Parser, Debug)]
#[command(name = "dyndnsd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Seconds between checks (overrides the configuration file)
    #[arg(short = 'r', long, env = "DYNDNS_REPEAT")]
    pub repeat: Option<u64>,

    /// Run a single check and exit
    #[arg(short = 'o', long)]
    pub once: bool,

    /// Configuration file location
    #[arg(short = 'c', long, env = "DYNDNS_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// DigitalOcean API token
    #[arg(short = 'a', long, env = "DYNDNS_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Record name inside the domain (e.g. "home", or "@" for the apex)
    #[arg(short = 's', long, env = "DYNDNS_SUBDOMAIN")]
    pub subdomain: Option<String>,

    /// Domain managed at DigitalOcean (e.g. "example.com")
    #[arg(short = 'd', long, env = "DYNDNS_DOMAIN")]
    pub domain: Option<String>,

    /// Keep the last-known IP in memory instead of a state file
    #[arg(short = 'm', long, conflicts_with = "state_file")]
    pub memory: bool,

    /// State file location (default: dyndns-state.json next to the config file)
    #[arg(long, env = "DYNDNS_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// When the last-known IP is recorded
    #[arg(long, env = "DYNDNS_STATE_POLICY", value_enum)]
    pub state_policy: Option<StatePolicyArg>,

    /// Look up records but never modify them
    #[arg(long)]
    pub dry_run: bool,

    /// Log verbosity
    #[arg(long, env = "DYNDNS_LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

impl Cli {
    /// Whether the command line alone is enough to run without a config file
    pub fn is_self_contained(&self) -> bool {
        self.domain.is_some()
            && self.subdomain.is_some()
            && self.auth_token.is_some()
            && (self.once || self.repeat.is_some())
    }
}

/// `--state-policy` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatePolicyArg {
    /// Record the IP as soon as it is resolved
    OnResolve,
    /// Record the IP only after the DNS record is known to hold it
    OnPublish,
}

impl From<StatePolicyArg> for StatePolicy {
    fn from(arg: StatePolicyArg) -> Self {
        match arg {
            StatePolicyArg::OnResolve => StatePolicy::OnResolve,
            StatePolicyArg::OnPublish => StatePolicy::OnPublish,
        }
    }
}

/// `--log-level` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}
