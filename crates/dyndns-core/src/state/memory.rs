// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Purpose
//
// Keeps the last-known IP in process memory only. Selected with `--memory`
// when no durable backend is wanted.
//
// ## Crash Behavior
//
// - All state is lost on restart/crash
// - First cycle after a restart sees an empty last-known IP and always
//   performs the provider lookup
// - No recovery possible (state is in-memory only)

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::{StateEntry, StateStore};

/// In-memory state store implementation
///
/// This implementation stores all state in a HashMap protected by a RwLock.
/// Clones share the same underlying map.
///
/// # Example
///
/// ```rust,no_run
/// use dyndns_core::state::MemoryStateStore;
/// use dyndns_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///
///     store.set("lastknownip", "1.2.3.4").await?;
///     assert_eq!(store.get("lastknownip").await?, Some("1.2.3.4".to_string()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<HashMap<String, StateEntry>>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of entries in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get_entry(&self, key: &str) -> Result<Option<StateEntry>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(key.to_string(), StateEntry::new(value));
        Ok(())
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing buffered
        Ok(())
    }
}
