//! Configuration types for the dyndns client
//!
//! The reconciler assumes a validated [`DynDnsConfig`]. The daemon builds
//! one from CLI flags, environment variables or a JSON config file and calls
//! [`DynDnsConfig::validate`] before anything touches the network.
//!
//! The JSON file format also accepts the flat keys written by older
//! releases of the tool (`domainname`, `subdomainname`, `authtoken`,
//! `repeat`). Hand-edited files of that format may hold the interval as a
//! string (`"repeat": "3600"`), which is accepted too.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Default IP-echo endpoint (JSON response `{"ip": "..."}`)
pub const DEFAULT_IP_ECHO_URL: &str = "https://api.ipify.org?format=json";

/// Default DigitalOcean API base URL
pub const DEFAULT_API_BASE: &str = "https://api.digitalocean.com/v2";

/// Default per-request timeout for every outbound call
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Prefix used for placeholder values in a freshly bootstrapped config file
pub const PLACEHOLDER_PREFIX: &str = "STR_";

/// Main dyndns configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DynDnsConfig {
    /// Zone whose records are managed (e.g. "example.com")
    #[serde(alias = "domainname")]
    pub domain_name: String,

    /// Record name inside the zone (e.g. "home", "vpn.home", or "@" for the apex)
    #[serde(alias = "subdomainname")]
    pub subdomain_name: String,

    /// Provider API token
    /// ⚠️ NEVER log this value
    #[serde(alias = "authtoken")]
    pub auth_token: String,

    /// Seconds between cycles; `None` means single-shot
    #[serde(default, alias = "repeat", deserialize_with = "deserialize_interval")]
    pub poll_interval_secs: Option<u64>,

    /// When the last-known IP is written to the state store
    #[serde(default)]
    pub state_policy: StatePolicy,

    /// IP-echo service settings
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// DNS provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// State store settings
    #[serde(default)]
    pub state_store: StateStoreConfig,
}

// Custom Debug implementation that hides the auth token
impl std::fmt::Debug for DynDnsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynDnsConfig")
            .field("domain_name", &self.domain_name)
            .field("subdomain_name", &self.subdomain_name)
            .field("auth_token", &"<REDACTED>")
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("state_policy", &self.state_policy)
            .field("ip_source", &self.ip_source)
            .field("provider", &self.provider)
            .field("state_store", &self.state_store)
            .finish()
    }
}

impl DynDnsConfig {
    /// Create a configuration with default settings for everything but the
    /// three required values
    pub fn new(
        domain_name: impl Into<String>,
        subdomain_name: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            domain_name: domain_name.into(),
            subdomain_name: subdomain_name.into(),
            auth_token: auth_token.into(),
            poll_interval_secs: None,
            state_policy: StatePolicy::default(),
            ip_source: IpSourceConfig::default(),
            provider: ProviderConfig::default(),
            state_store: StateStoreConfig::default(),
        }
    }

    /// The placeholder file written when no configuration exists yet
    pub fn template() -> Self {
        let mut config = Self::new(
            format!("{}DOMAINNAME", PLACEHOLDER_PREFIX),
            format!("{}SUBDOMAINNAME", PLACEHOLDER_PREFIX),
            format!("{}AUTHTOKEN", PLACEHOLDER_PREFIX),
        );
        config.poll_interval_secs = Some(3600);
        config
    }

    /// Set the poll interval
    pub fn with_poll_interval(mut self, secs: Option<u64>) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// Set the state policy
    pub fn with_state_policy(mut self, policy: StatePolicy) -> Self {
        self.state_policy = policy;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        for (field, value) in [
            ("domain name", &self.domain_name),
            ("subdomain name", &self.subdomain_name),
            ("auth token", &self.auth_token),
        ] {
            if value.trim().is_empty() {
                return Err(crate::Error::config(format!("{} cannot be empty", field)));
            }
            if value.starts_with(PLACEHOLDER_PREFIX) {
                return Err(crate::Error::config(format!(
                    "{} still holds the placeholder '{}'. \
                    Edit the configuration file before running.",
                    field, value
                )));
            }
        }

        validate_domain_name(&self.domain_name)?;
        validate_record_name(&self.subdomain_name)?;

        if self.poll_interval_secs == Some(0) {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }

        self.ip_source.validate()?;
        self.provider.validate()?;
        self.state_store.validate()?;

        Ok(())
    }
}

/// When the reconciler writes the resolved IP into the state store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatePolicy {
    /// Persist right after every successful resolve, before any DNS work.
    ///
    /// A failed record update is not retried until the public IP changes
    /// again, because the next cycle sees `last == current` and stops.
    #[default]
    OnResolve,

    /// Persist only once the provider is known to hold the IP
    /// (unchanged, already current, or updated).
    ///
    /// Failed lookups and updates leave the old value in place so the next
    /// cycle repeats the DNS work.
    OnPublish,
}

/// IP-echo service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpSourceConfig {
    /// URL returning `{"ip": "<ipv4>"}`
    #[serde(default = "default_ip_echo_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl IpSourceConfig {
    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_url("IP source URL", &self.url)?;
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("IP source timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            url: default_ip_echo_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API base URL, without trailing slash
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Perform reads but skip record updates
    #[serde(default)]
    pub dry_run: bool,
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_url("Provider API base", &self.api_base)?;
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Provider timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            dry_run: false,
        }
    }
}

/// State store configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateStoreConfig {
    /// File-based state store
    File {
        /// Path to the state file
        path: PathBuf,
    },

    /// In-memory state store (not persistent)
    #[default]
    Memory,
}

impl StateStoreConfig {
    /// Validate the state store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StateStoreConfig::File { path } if path.as_os_str().is_empty() => {
                Err(crate::Error::config("State file path cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

fn default_ip_echo_url() -> String {
    DEFAULT_IP_ECHO_URL.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn validate_url(field: &str, url: &str) -> Result<(), crate::Error> {
    if url.is_empty() {
        return Err(crate::Error::config(format!("{} cannot be empty", field)));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(crate::Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            field, url
        )));
    }
    Ok(())
}

/// Basic DNS name validation per RFC 1035
///
/// Not comprehensive, but catches the common typos.
fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(crate::Error::config(format!(
            "Domain name must contain at least one dot. Got: {}",
            domain
        )));
    }

    for label in domain.split('.') {
        validate_label(label)
            .map_err(|e| crate::Error::config(format!("Invalid domain '{}': {}", domain, e)))?;
    }

    Ok(())
}

/// Record name relative to the zone: `@`, or dot-separated labels where
/// only the leftmost may be the wildcard `*`
fn validate_record_name(name: &str) -> Result<(), crate::Error> {
    if name == "@" {
        return Ok(());
    }

    for (i, label) in name.split('.').enumerate() {
        if i == 0 && label == "*" {
            continue;
        }
        validate_label(label).map_err(|e| {
            crate::Error::config(format!("Invalid subdomain '{}': {}", name, e))
        })?;
    }

    Ok(())
}

/// Accepts `600`, `"600"` or `null`
///
/// Any other string is an unedited placeholder such as `"INT_INSECONDS"`.
fn deserialize_interval<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Interval {
        Secs(u64),
        Text(String),
    }

    match Option::<Interval>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Interval::Secs(secs)) => Ok(Some(secs)),
        Some(Interval::Text(text)) => text.trim().parse().map(Some).map_err(|_| {
            D::Error::custom(format!(
                "poll interval still holds the placeholder '{}'. \
                Edit the configuration file before running.",
                text
            ))
        }),
    }
}

fn validate_label(label: &str) -> Result<(), crate::Error> {
    if label.is_empty() {
        return Err(crate::Error::config("empty DNS label"));
    }

    if label.len() > 63 {
        return Err(crate::Error::config(format!(
            "DNS label too long: {} chars (max 63). Label: '{}'",
            label.len(),
            label
        )));
    }

    if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(crate::Error::config(format!(
            "DNS label contains invalid characters. Label: '{}'",
            label
        )));
    }

    if label.starts_with('-') || label.ends_with('-') {
        return Err(crate::Error::config(format!(
            "DNS label cannot start or end with hyphen. Label: '{}'",
            label
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> DynDnsConfig {
        DynDnsConfig::new("example.com", "home", "dop_v1_secret")
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().validate().is_ok());
        assert!(valid().with_poll_interval(Some(300)).validate().is_ok());
    }

    #[test]
    fn test_apex_subdomain_allowed() {
        let config = DynDnsConfig::new("example.com", "@", "token");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_fields_rejected() {
        assert!(DynDnsConfig::new("", "home", "t").validate().is_err());
        assert!(DynDnsConfig::new("example.com", "", "t").validate().is_err());
        assert!(DynDnsConfig::new("example.com", "home", " ").validate().is_err());
    }

    #[test]
    fn test_template_fails_validation() {
        let err = DynDnsConfig::template().validate().unwrap_err();
        assert!(err.to_string().contains("placeholder"));
    }

    #[test]
    fn test_invalid_names_rejected() {
        assert!(DynDnsConfig::new("localhost", "home", "t").validate().is_err());
        assert!(DynDnsConfig::new("exa mple.com", "home", "t").validate().is_err());
        assert!(DynDnsConfig::new("example.com", "-home", "t").validate().is_err());
        assert!(DynDnsConfig::new("example.com", "a..b", "t").validate().is_err());
        assert!(DynDnsConfig::new("example.com", "vpn.", "t").validate().is_err());
        assert!(DynDnsConfig::new("example.com", "vpn.*", "t").validate().is_err());
    }

    #[test]
    fn test_multi_label_subdomain_allowed() {
        assert!(DynDnsConfig::new("example.com", "vpn.home", "t").validate().is_ok());
        assert!(DynDnsConfig::new("example.com", "*.home", "t").validate().is_ok());

        let err = DynDnsConfig::new("example.com", "vpn.-home", "t")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("vpn.-home"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(valid().with_poll_interval(Some(0)).validate().is_err());
    }

    #[test]
    fn test_bad_urls_rejected() {
        let mut config = valid();
        config.ip_source.url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.provider.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_state_path_rejected() {
        let mut config = valid();
        config.state_store = StateStoreConfig::File {
            path: PathBuf::new(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_legacy_keys_accepted() {
        let json = r#"{
            "domainname": "example.com",
            "subdomainname": "home",
            "authtoken": "secret",
            "repeat": 600
        }"#;

        let config: DynDnsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.domain_name, "example.com");
        assert_eq!(config.subdomain_name, "home");
        assert_eq!(config.auth_token, "secret");
        assert_eq!(config.poll_interval_secs, Some(600));
        assert_eq!(config.state_policy, StatePolicy::OnResolve);
        assert_eq!(config.ip_source.url, DEFAULT_IP_ECHO_URL);
        assert_eq!(config.provider.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_legacy_string_interval_accepted() {
        let json = r#"{
            "domainname": "example.com",
            "subdomainname": "home",
            "authtoken": "secret",
            "repeat": "3600"
        }"#;

        let config: DynDnsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.poll_interval_secs, Some(3600));

        let json = r#"{
            "domain_name": "example.com",
            "subdomain_name": "home",
            "auth_token": "secret",
            "poll_interval_secs": null
        }"#;
        let config: DynDnsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.poll_interval_secs, None);
    }

    #[test]
    fn test_legacy_interval_placeholder_rejected() {
        let json = r#"{
            "domainname": "example.com",
            "subdomainname": "home",
            "authtoken": "secret",
            "repeat": "INT_INSECONDS"
        }"#;

        let err = serde_json::from_str::<DynDnsConfig>(json).unwrap_err();
        assert!(err.to_string().contains("still holds the placeholder 'INT_INSECONDS'"));
    }

    #[test]
    fn test_state_policy_serde() {
        let json = r#"{
            "domain_name": "example.com",
            "subdomain_name": "home",
            "auth_token": "secret",
            "state_policy": "on_publish",
            "state_store": { "type": "file", "path": "/var/lib/dyndns/state.json" }
        }"#;

        let config: DynDnsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.state_policy, StatePolicy::OnPublish);
        assert_eq!(
            config.state_store,
            StateStoreConfig::File {
                path: PathBuf::from("/var/lib/dyndns/state.json")
            }
        );
    }

    #[test]
    fn test_auth_token_not_exposed_in_debug() {
        let config = DynDnsConfig::new("example.com", "home", "secret_token_12345");
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("secret_token_12345"));
        assert!(debug_str.contains("<REDACTED>"));
    }
}
