//! Error types for the dyndns client
//!
//! Every outbound call, state store operation and configuration check
//! reports through [`Error`]. The reconciler propagates these to the cycle
//! boundary, where they are logged and turned into a
//! [`CycleReport`](crate::reconciler::CycleReport).

use thiserror::Error;

/// Result type alias for dyndns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the dyndns client
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure or non-2xx HTTP status
    #[error("Network error: {0}")]
    Network(String),

    /// Response body was not the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configured subdomain has no A record in the zone
    #[error("Record not found: no A record named '{name}' in domain {domain}")]
    RecordNotFound {
        /// Subdomain that was searched for
        name: String,
        /// Domain whose records were listed
        domain: String,
    },

    /// State store read/write errors
    #[error("State store error: {0}")]
    Persistence(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a "record not found" error
    pub fn record_not_found(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self::RecordNotFound {
            name: name.into(),
            domain: domain.into(),
        }
    }

    /// Create a state store error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the next scheduled cycle may succeed without operator action
    ///
    /// Network and persistence failures are expected to clear on their own.
    /// A missing record or a bad configuration will fail every cycle until
    /// someone fixes the zone or the config.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Persistence(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
