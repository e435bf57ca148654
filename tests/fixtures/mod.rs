//! Test fixtures shared by the integration tests

use raid_queue::error::{QueueError, Result};
use raid_queue::estimate::{EstimatorConfig, QueueEstimator, StatusFormatter};
use raid_queue::persistence::{InMemoryStore, PersistenceStore};
use raid_queue::{ManualClock, QueueService};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 2023-11-14T22:13:20Z
pub const START_MILLIS: i64 = 1_700_000_000_000;

pub fn test_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::at_millis(START_MILLIS))
}

/// Estimator on a manual clock with deterministic formatting
pub fn test_estimator(config: EstimatorConfig, clock: Arc<ManualClock>) -> QueueEstimator {
    QueueEstimator::new(config, clock)
        .unwrap()
        .with_formatter(StatusFormatter::utc_24h())
}

/// Service that restores from, and saves into, the shared store
pub fn open_service(
    config: EstimatorConfig,
    clock: Arc<ManualClock>,
    store: Arc<InMemoryStore>,
) -> QueueService {
    QueueService::open(test_estimator(config, clock), Box::new(store))
}

/// Store that rejects every operation and counts attempts
#[derive(Debug, Default)]
pub struct FailingStore {
    attempts: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn fail<T>(&self, operation: &str) -> Result<T> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(QueueError::PersistenceFailed {
            message: format!("{} refused", operation),
        }
        .into())
    }
}

impl PersistenceStore for FailingStore {
    fn save(&self, _blob: &str) -> Result<()> {
        self.fail("save")
    }

    fn load(&self) -> Result<Option<String>> {
        self.fail("load")
    }

    fn clear(&self) -> Result<()> {
        self.fail("clear")
    }
}
