// Snapshot storage backends.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Somewhere a serialized draft state can be written and read back.
///
/// Implementations hold at most one "current" snapshot.
pub trait SnapshotStore: Send + Sync {
    /// Short label used in log lines.
    fn name(&self) -> &str;

    fn save(&self, snapshot: &serde_json::Value) -> Result<()>;

    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<serde_json::Value>>;

    /// When the current snapshot was written, if the store knows.
    fn saved_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(None)
    }
}

/// A snapshot read back from a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    pub value: serde_json::Value,
    pub saved_at: Option<DateTime<Utc>>,
}

/// Pretty-printed JSON file on disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn name(&self) -> &str {
        "json-file"
    }

    fn save(&self, snapshot: &serde_json::Value) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let text =
            serde_json::to_string_pretty(snapshot).context("failed to serialize snapshot")?;
        std::fs::write(&self.path, text)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }

    fn load(&self) -> Result<Option<serde_json::Value>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let value = serde_json::from_str(&text)
            .with_context(|| format!("invalid JSON in {}", self.path.display()))?;
        Ok(Some(value))
    }

    /// The file's modification time.
    fn saved_at(&self) -> Result<Option<DateTime<Utc>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let modified = std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .with_context(|| format!("failed to stat {}", self.path.display()))?;
        Ok(Some(DateTime::<Utc>::from(modified)))
    }
}

/// Return the first snapshot found, trying `stores` in order.
///
/// A store that fails to load is logged and skipped. A timestamp that cannot
/// be read is logged and left out.
pub fn load_first(stores: &[Box<dyn SnapshotStore>]) -> Option<StoredSnapshot> {
    for store in stores {
        match store.load() {
            Ok(Some(value)) => {
                info!("Loaded snapshot from {} store", store.name());
                let saved_at = store.saved_at().unwrap_or_else(|e| {
                    warn!("{} store has no readable timestamp: {:#}", store.name(), e);
                    None
                });
                return Some(StoredSnapshot { value, saved_at });
            }
            Ok(None) => {}
            Err(e) => warn!("{} store failed to load: {:#}", store.name(), e),
        }
    }
    None
}
