// # File State Store
//
// JSON-file implementation of StateStore.
//
// Keeps the last-known IP across daemon restarts so the first cycle after a
// restart does not hit the provider API when nothing changed.
//
// ## On-disk layout
//
// - `<path>`: current state
// - `<path>.tmp`: staging file, renamed over `<path>` once synced
// - `<path>.backup`: previous good state, used when `<path>` fails to parse
//
// ```json
// {
//   "version": "1.0",
//   "entries": {
//     "lastknownip": {
//       "value": "1.2.3.4",
//       "updated_at": "2025-01-09T12:00:00Z"
//     }
//   }
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::Error;
use crate::traits::state_store::{StateEntry, StateStore};

/// Current on-disk format version
const FORMAT_VERSION: &str = "1.0";

type Entries = HashMap<String, StateEntry>;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: String,
    entries: Entries,
}

/// File-based state store with crash recovery
///
/// Every `set` is written through to disk before it returns.
///
/// # Example
///
/// ```rust,no_run
/// use dyndns_core::state::FileStateStore;
/// use dyndns_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/lib/dyndns/state.json").await?;
///
///     store.set("lastknownip", "1.2.3.4").await?;
///     assert_eq!(store.get("lastknownip").await?, Some("1.2.3.4".to_string()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug)]
struct Inner {
    entries: Entries,
    /// Set when `entries` differs from what is on disk
    unsaved: bool,
}

impl FileStateStore {
    /// Open the store at `path`, creating parent directories as needed
    ///
    /// A file that fails to parse is replaced by its backup; with no usable
    /// backup the store starts empty. Only I/O failures are returned.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| io_error("create directory", dir, e))?;
        }

        let entries = recover(&path).await?;

        Ok(Self {
            path,
            inner: Arc::new(Mutex::new(Inner {
                entries,
                unsaved: false,
            })),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current entries: stage, sync, back up, rename
    async fn save(&self, inner: &mut Inner) -> Result<(), Error> {
        let snapshot = Snapshot {
            version: FORMAT_VERSION.to_string(),
            entries: inner.entries.clone(),
        };
        let json = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| Error::persistence(format!("Failed to serialize state: {}", e)))?;

        let staging = sibling(&self.path, "tmp");
        let mut file = fs::File::create(&staging)
            .await
            .map_err(|e| io_error("create", &staging, e))?;
        file.write_all(&json)
            .await
            .map_err(|e| io_error("write", &staging, e))?;
        file.sync_all()
            .await
            .map_err(|e| io_error("sync", &staging, e))?;
        drop(file);

        if self.path.exists()
            && let Err(e) = fs::copy(&self.path, sibling(&self.path, "backup")).await
        {
            tracing::warn!("Could not back up {}: {}", self.path.display(), e);
        }

        fs::rename(&staging, &self.path)
            .await
            .map_err(|e| io_error("replace", &self.path, e))?;

        inner.unsaved = false;
        tracing::trace!("State saved to {}", self.path.display());
        Ok(())
    }
}

/// Load `path`, falling back to its backup when it is corrupt
async fn recover(path: &Path) -> Result<Entries, Error> {
    let corruption = match read_snapshot(path).await {
        Ok(entries) => {
            tracing::debug!("Loaded {} state entries from {}", entries.len(), path.display());
            return Ok(entries);
        }
        Err(e @ Error::Parse(_)) => e,
        Err(e) => return Err(e),
    };

    tracing::warn!("{}; trying backup", corruption);

    let backup = sibling(path, "backup");
    if !backup.exists() {
        tracing::warn!("No backup at {}, starting with empty state", backup.display());
        return Ok(Entries::new());
    }

    match read_snapshot(&backup).await {
        Ok(entries) => {
            tracing::info!("Recovered {} state entries from backup", entries.len());
            if let Err(e) = fs::copy(&backup, path).await {
                tracing::error!("Could not restore {} from backup: {}", path.display(), e);
            }
            Ok(entries)
        }
        Err(e) => {
            tracing::error!("Backup unusable too ({}), starting with empty state", e);
            Ok(Entries::new())
        }
    }
}

/// Read one snapshot file; a missing file is an empty state
///
/// Returns `Error::Parse` for unparseable content and `Error::Persistence`
/// when the file cannot be read.
async fn read_snapshot(path: &Path) -> Result<Entries, Error> {
    if !path.exists() {
        return Ok(Entries::new());
    }

    let raw = fs::read(path).await.map_err(|e| io_error("read", path, e))?;
    let snapshot: Snapshot = serde_json::from_slice(&raw).map_err(|e| {
        Error::parse(format!("State file {} is corrupt: {}", path.display(), e))
    })?;

    if snapshot.version != FORMAT_VERSION {
        tracing::warn!(
            "State file {} has format version {}, expected {}",
            path.display(),
            snapshot.version,
            FORMAT_VERSION
        );
    }

    Ok(snapshot.entries)
}

/// `state.json` → `state.json.<suffix>`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> Error {
    Error::persistence(format!("Failed to {} {}: {}", action, path.display(), err))
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get_entry(&self, key: &str) -> Result<Option<StateEntry>, Error> {
        Ok(self.inner.lock().await.entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut inner = self.inner.lock().await;
        inner.entries.insert(key.to_string(), StateEntry::new(value));
        inner.unsaved = true;
        self.save(&mut inner).await
    }

    async fn flush(&self) -> Result<(), Error> {
        let mut inner = self.inner.lock().await;
        if inner.unsaved {
            self.save(&mut inner).await?;
        }
        Ok(())
    }
}
