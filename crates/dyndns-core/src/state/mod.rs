// # State Store Implementations
//
// This module provides implementations of the StateStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;

use crate::config::StateStoreConfig;
use crate::error::Result;
use crate::traits::StateStore;

/// Build the state store selected by the configuration
///
/// A file store that cannot be opened is an error; the caller treats it as
/// fatal at startup.
pub async fn open(config: &StateStoreConfig) -> Result<Box<dyn StateStore>> {
    match config {
        StateStoreConfig::File { path } => {
            tracing::info!("Using file state store at {}", path.display());
            Ok(Box::new(FileStateStore::new(path).await?))
        }
        StateStoreConfig::Memory => {
            tracing::info!("Using in-memory state store (not persisted)");
            Ok(Box::new(MemoryStateStore::new()))
        }
    }
}
