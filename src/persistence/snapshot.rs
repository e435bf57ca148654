//! Serialized estimator state
//!
//! Instants are stored as integer epoch milliseconds. Keys use camelCase so
//! the blob matches the format the browser tracker wrote to local storage.

use crate::error::{QueueError, Result};
use crate::estimate::statistics::BossHistory;
use crate::persistence::store::PersistenceStore;
use crate::types::{BossId, Observation, QueueSize};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Full estimator state as written to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub active: bool,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub finish_time: Option<DateTime<Utc>>,
    pub initial_size: QueueSize,
    pub current_size: QueueSize,
    pub per_unit_estimate_seconds: f64,
    #[serde(default)]
    pub boss_id: Option<BossId>,
    #[serde(default)]
    pub observations: Vec<Observation>,
    #[serde(default)]
    pub boss_history: HashMap<BossId, BossHistory>,
}

impl QueueSnapshot {
    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            QueueError::persistence(format!("failed to serialize snapshot: {}", e)).into()
        })
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            QueueError::InvalidSnapshot {
                reason: format!("failed to deserialize snapshot: {}", e),
            }
            .into()
        })
    }
}

/// Write a snapshot; failures are logged and reported as `false`
pub fn save_snapshot(store: &dyn PersistenceStore, snapshot: &QueueSnapshot) -> bool {
    let result = snapshot.to_json().and_then(|json| store.save(&json));

    match result {
        Ok(()) => {
            debug!("Saved queue snapshot (active: {})", snapshot.active);
            true
        }
        Err(e) => {
            warn!("Skipping save of queue state: {}", e);
            false
        }
    }
}

/// Read a snapshot; missing, unreadable or corrupt state all yield `None`
pub fn load_snapshot(store: &dyn PersistenceStore) -> Option<QueueSnapshot> {
    let blob = match store.load() {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            debug!("No saved queue state");
            return None;
        }
        Err(e) => {
            warn!("Could not read saved queue state: {}", e);
            return None;
        }
    };

    match QueueSnapshot::from_json(&blob) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("Ignoring corrupt queue state: {}", e);
            None
        }
    }
}
