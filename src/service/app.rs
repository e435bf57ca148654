//! Queue session service
//!
//! This module wires the estimator to its persistence store. Every mutating
//! call is followed by a best-effort save, and saved state is restored when
//! the service opens.

use crate::clock::{Clock, SystemClock};
use crate::config::{AppConfig, StorageSettings};
use crate::error::Result;
use crate::estimate::tracker::QueueEstimator;
use crate::persistence::snapshot::{load_snapshot, save_snapshot};
use crate::persistence::store::{default_data_dir, FileStore, InMemoryStore, PersistenceStore};
use crate::types::{BossStats, QueueSize, QueueStatus, UpdateOutcome};
use crate::utils::parse_queue_size;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// File store for `settings`, or an in-memory store when no data directory can be found
fn store_for<F>(settings: &StorageSettings, default_dir: F) -> Box<dyn PersistenceStore>
where
    F: FnOnce() -> Result<PathBuf>,
{
    let dir = match &settings.data_dir {
        Some(dir) => dir.clone(),
        None => match default_dir() {
            Ok(dir) => dir,
            Err(e) => {
                warn!("Queue state will not be saved: {}", e);
                return Box::new(InMemoryStore::new());
            }
        },
    };

    let store = FileStore::new(dir, &settings.key);
    info!("Using state file {}", store.path().display());
    Box::new(store)
}

/// Estimator plus the store that keeps it across restarts
pub struct QueueService {
    estimator: QueueEstimator,
    store: Box<dyn PersistenceStore>,
}

impl QueueService {
    /// Combine an estimator and a store without touching saved state
    pub fn new(estimator: QueueEstimator, store: Box<dyn PersistenceStore>) -> Self {
        Self { estimator, store }
    }

    /// Combine an estimator and a store, restoring any saved state
    pub fn open(estimator: QueueEstimator, store: Box<dyn PersistenceStore>) -> Self {
        let mut service = Self::new(estimator, store);
        service.restore();
        service
    }

    /// Build the service described by `config`, using the wall clock and a file store
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::from_config_with_clock(config, Arc::new(SystemClock))
    }

    pub fn from_config_with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let estimator = QueueEstimator::new(config.estimator.clone(), clock)?
            .with_formatter(config.display.formatter());

        let store = store_for(&config.storage, default_data_dir);
        Ok(Self::open(estimator, store))
    }

    /// Reload saved state. Missing or unusable state leaves the estimator untouched.
    pub fn restore(&mut self) -> bool {
        let Some(snapshot) = load_snapshot(self.store.as_ref()) else {
            return false;
        };

        match self.estimator.restore(snapshot) {
            Ok(()) => true,
            Err(e) => {
                warn!("Discarding saved queue state: {}", e);
                false
            }
        }
    }

    /// Save the current state; failures are logged and ignored
    pub fn persist(&self) -> bool {
        save_snapshot(self.store.as_ref(), &self.estimator.snapshot())
    }

    pub fn start(&mut self, size: QueueSize, boss_id: &str) -> Result<QueueStatus> {
        let status = self.estimator.start_queue(size, boss_id)?;
        self.persist();
        Ok(status)
    }

    /// Start from raw user input
    pub fn start_from_input(&mut self, size: &str, boss_id: &str) -> Result<QueueStatus> {
        let size = parse_queue_size(size)?;
        self.start(size, boss_id)
    }

    pub fn update(&mut self, size: QueueSize) -> UpdateOutcome {
        let outcome = self.estimator.update_queue(size);
        if !outcome.is_not_active() {
            self.persist();
        }
        outcome
    }

    /// Update from raw user input
    pub fn update_from_input(&mut self, size: &str) -> Result<UpdateOutcome> {
        let size = parse_queue_size(size)?;
        Ok(self.update(size))
    }

    /// Abandon the current run; history is kept and saved
    pub fn leave(&mut self) -> QueueStatus {
        self.estimator.reset();
        self.persist();
        self.estimator.status()
    }

    pub fn status(&self) -> QueueStatus {
        self.estimator.status()
    }

    pub fn boss_stats(&self, boss_id: Option<&str>) -> Option<BossStats> {
        self.estimator.boss_stats(boss_id)
    }

    /// Delete the saved blob. In-memory state is left as is.
    pub fn clear_saved_state(&self) -> Result<()> {
        self.store.clear()?;
        info!("Cleared saved queue state");
        Ok(())
    }

    pub fn estimator(&self) -> &QueueEstimator {
        &self.estimator
    }
}
