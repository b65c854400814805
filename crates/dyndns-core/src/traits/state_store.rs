// # State Store Trait
//
// Defines the interface for persistent state management.
//
// ## Purpose
//
// The state store holds the last-known public IP between cycles so the
// reconciler can skip provider calls when nothing changed. The core only
// ever uses one key, [`LAST_KNOWN_IP_KEY`].
//
// ## Implementations
//
// - File-based: JSON file with atomic writes (`FileStateStore`)
// - In-memory: non-durable (`MemoryStateStore`)
//
// ## Usage
//
// ```rust,ignore
// use dyndns_core::StateStore;
// use dyndns_core::traits::LAST_KNOWN_IP_KEY;
//
// #[tokio::main]
// async fn main() -> Result<(), Box<dyn std::error::Error>> {
//     let store = /* StateStore implementation */;
//
//     let last_ip = store.get(LAST_KNOWN_IP_KEY).await?;
//     store.set(LAST_KNOWN_IP_KEY, "1.2.3.4").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Key under which the reconciler stores the last-known IP
pub const LAST_KNOWN_IP_KEY: &str = "lastknownip";

/// A stored value with its write timestamp
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StateEntry {
    /// The stored value, byte-for-byte as written
    pub value: String,
    /// Timestamp of the last write
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl StateEntry {
    /// Create an entry stamped with the current time
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            updated_at: chrono::Utc::now(),
        }
    }

    /// Time elapsed since the entry was written
    pub fn age(&self) -> chrono::Duration {
        chrono::Utc::now().signed_duration_since(self.updated_at)
    }
}

/// Trait for state store implementations
///
/// Values are stored and returned without normalization: writing `X` and
/// reading it back yields `X`.
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks, even
/// though the reconciler is the only writer.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the full entry for a key
    ///
    /// # Returns
    ///
    /// - `Ok(Some(StateEntry))`: The stored entry
    /// - `Ok(None)`: Key never written
    /// - `Err(Error)`: Storage error
    async fn get_entry(&self, key: &str) -> Result<Option<StateEntry>, crate::Error>;

    /// Get the value for a key
    async fn get(&self, key: &str) -> Result<Option<String>, crate::Error> {
        Ok(self.get_entry(key).await?.map(|entry| entry.value))
    }

    /// Create or overwrite the value for a key
    async fn set(&self, key: &str, value: &str) -> Result<(), crate::Error>;

    /// Persist any pending changes
    ///
    /// Some implementations may buffer writes. This ensures
    /// all changes are flushed to persistent storage.
    async fn flush(&self) -> Result<(), crate::Error>;
}
