//! Blob storage interface and implementations

use crate::error::{QueueError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Name of the blob holding estimator state
pub const DEFAULT_STORE_KEY: &str = "queue-data";

/// Trait for storing a single serialized state blob
#[cfg_attr(test, mockall::automock)]
pub trait PersistenceStore: Send + Sync {
    /// Overwrite the stored blob
    fn save(&self, blob: &str) -> Result<()>;

    /// Read the stored blob, if any
    fn load(&self) -> Result<Option<String>>;

    /// Remove the stored blob
    fn clear(&self) -> Result<()>;
}

impl<S: PersistenceStore + ?Sized> PersistenceStore for Arc<S> {
    fn save(&self, blob: &str) -> Result<()> {
        (**self).save(blob)
    }

    fn load(&self) -> Result<Option<String>> {
        (**self).load()
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

/// JSON file under a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store `<dir>/<key>.json`
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", key)),
        }
    }

    /// Store under the platform data directory
    pub fn in_data_dir(key: &str) -> Result<Self> {
        let dir = default_data_dir()?;
        Ok(Self::new(dir, key))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `<platform data dir>/raid-queue`
pub fn default_data_dir() -> Result<PathBuf> {
    let dir = dirs::data_dir()
        .ok_or_else(|| QueueError::persistence("could not find data directory"))?
        .join("raid-queue");
    Ok(dir)
}

impl PersistenceStore for FileStore {
    fn save(&self, blob: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    QueueError::persistence(format!(
                        "failed to create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        fs::write(&self.path, blob).map_err(|e| {
            QueueError::persistence(format!("failed to write {}: {}", self.path.display(), e))
        })?;

        debug!("Saved {} bytes to {}", blob.len(), self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| {
            QueueError::persistence(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        Ok(Some(contents))
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                QueueError::persistence(format!(
                    "failed to remove {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

/// In-memory store, mostly for tests and embedding
#[derive(Debug, Default)]
pub struct InMemoryStore {
    blob: RwLock<Option<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing blob
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: RwLock::new(Some(blob.into())),
        }
    }
}

impl PersistenceStore for InMemoryStore {
    fn save(&self, blob: &str) -> Result<()> {
        let mut stored = self
            .blob
            .write()
            .map_err(|_| QueueError::persistence("failed to acquire store write lock"))?;
        *stored = Some(blob.to_string());
        Ok(())
    }

    fn load(&self) -> Result<Option<String>> {
        let stored = self
            .blob
            .read()
            .map_err(|_| QueueError::persistence("failed to acquire store read lock"))?;
        Ok(stored.clone())
    }

    fn clear(&self) -> Result<()> {
        let mut stored = self
            .blob
            .write()
            .map_err(|_| QueueError::persistence("failed to acquire store write lock"))?;
        *stored = None;
        Ok(())
    }
}
