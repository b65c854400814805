//! Startup configuration resolution
//!
//! Precedence, highest first: command-line flags and `DYNDNS_*` variables,
//! then the JSON configuration file. A missing file is replaced by a
//! template with placeholder values and the daemon stops so the operator
//! can fill it in.

use crate::cli::Cli;
use anyhow::{Context, Result};
use dyndns_core::{DynDnsConfig, StateStoreConfig};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// State file name used when none is configured
pub const DEFAULT_STATE_FILE: &str = "dyndns-state.json";

/// What `resolve` decided
#[derive(Debug)]
pub enum Startup {
    /// Configuration is complete and valid
    Run(Settings),
    /// A template configuration was written to this path
    TemplateCreated(PathBuf),
}

/// How often cycles run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One cycle, then exit
    Once,
    /// A cycle now and then at every interval until a shutdown signal
    Every(Duration),
}

/// Fully resolved daemon settings
#[derive(Debug)]
pub struct Settings {
    pub config: DynDnsConfig,
    pub mode: RunMode,
}

/// Build validated settings from the command line and the config file
pub fn resolve(cli: &Cli) -> Result<Startup> {
    let (mut config, state_store_from_file) = if cli.is_self_contained() {
        info!("All required values given on the command line, not reading a config file");
        let config = DynDnsConfig::new(
            cli.domain.clone().unwrap_or_default(),
            cli.subdomain.clone().unwrap_or_default(),
            cli.auth_token.clone().unwrap_or_default(),
        );
        (config, false)
    } else {
        if !cli.config.exists() {
            write_template(&cli.config)?;
            return Ok(Startup::TemplateCreated(cli.config.clone()));
        }
        load_config_file(&cli.config, cli.repeat.is_some())?
    };

    apply_overrides(cli, &mut config, state_store_from_file);

    let mode = if cli.once {
        RunMode::Once
    } else {
        match config.poll_interval_secs {
            Some(secs) => RunMode::Every(Duration::from_secs(secs)),
            None => RunMode::Once,
        }
    };

    config.validate().context("invalid configuration")?;
    debug!("Resolved configuration: {:?}", config);

    Ok(Startup::Run(Settings { config, mode }))
}

/// Load the JSON config file
///
/// Also reports whether the file chose a state store itself, so the
/// default file store is only applied when it did not. With
/// `repeat_overridden`, the file's interval is not read at all.
fn load_config_file(path: &Path, repeat_overridden: bool) -> Result<(DynDnsConfig, bool)> {
    info!("Reading configuration from {}", path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let has_state_store = value.get("state_store").is_some();

    if repeat_overridden && let Some(fields) = value.as_object_mut() {
        fields.remove("poll_interval_secs");
        fields.remove("repeat");
    }

    let config: DynDnsConfig = serde_json::from_value(value)
        .with_context(|| format!("{} has missing or invalid fields", path.display()))?;

    Ok((config, has_state_store))
}

/// Write the placeholder configuration; never overwrites an existing file
fn write_template(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    // Leave the state store out so the default file store applies
    let mut template = serde_json::to_value(DynDnsConfig::template())?;
    if let Some(fields) = template.as_object_mut() {
        fields.remove("state_store");
    }
    let json = serde_json::to_string_pretty(&template)?;
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;

    Ok(())
}

fn apply_overrides(cli: &Cli, config: &mut DynDnsConfig, state_store_from_file: bool) {
    if let Some(domain) = &cli.domain {
        config.domain_name = domain.clone();
    }
    if let Some(subdomain) = &cli.subdomain {
        config.subdomain_name = subdomain.clone();
    }
    if let Some(token) = &cli.auth_token {
        config.auth_token = token.clone();
    }
    if let Some(repeat) = cli.repeat {
        info!("Overriding repeat interval with {}s", repeat);
        config.poll_interval_secs = Some(repeat);
    }
    if let Some(policy) = cli.state_policy {
        config.state_policy = policy.into();
    }
    if cli.dry_run {
        config.provider.dry_run = true;
    }

    if cli.memory {
        config.state_store = StateStoreConfig::Memory;
    } else if let Some(path) = &cli.state_file {
        config.state_store = StateStoreConfig::File { path: path.clone() };
    } else if !state_store_from_file {
        config.state_store = StateStoreConfig::File {
            path: default_state_path(&cli.config),
        };
    }
}

/// `dyndns-state.json` in the directory holding the config file
fn default_state_path(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(DEFAULT_STATE_FILE),
        _ => PathBuf::from(DEFAULT_STATE_FILE),
    }
}
