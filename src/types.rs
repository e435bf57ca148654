//! Common types used throughout the queue estimator

use crate::error::{QueueError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of the boss a queue run belongs to
pub type BossId = String;

/// Number of people ahead in the queue
pub type QueueSize = u32;

/// Lifecycle state of the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueState {
    Idle,
    Active,
    Completed,
}

impl std::fmt::Display for QueueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueState::Idle => write!(f, "Idle"),
            QueueState::Active => write!(f, "Active"),
            QueueState::Completed => write!(f, "Completed"),
        }
    }
}

/// A timestamped queue-size report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub time: DateTime<Utc>,
    pub size: QueueSize,
}

impl Observation {
    pub fn new(time: DateTime<Utc>, size: QueueSize) -> Self {
        Self { time, size }
    }
}

/// Status of a running queue, with raw values and display strings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveStatus {
    pub boss_id: BossId,
    pub current_size: QueueSize,
    pub initial_size: QueueSize,
    pub start_time: DateTime<Utc>,
    pub start_time_display: String,
    pub now: DateTime<Utc>,
    pub now_display: String,
    pub elapsed_seconds: f64,
    pub elapsed_display: String,
    pub projected_finish_time: DateTime<Utc>,
    pub projected_finish_display: String,
    /// Never negative
    pub remaining_seconds: f64,
    pub remaining_display: String,
    pub per_unit_estimate_seconds: f64,
    /// Estimate rounded to one decimal place
    pub per_unit_estimate_rounded: f64,
    pub per_unit_estimate_display: String,
}

/// Snapshot of the tracker handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum QueueStatus {
    Idle {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Completed {
        message: String,
        finish_time: DateTime<Utc>,
        finish_time_display: String,
        boss_id: BossId,
    },
    Active(ActiveStatus),
}

impl QueueStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, QueueStatus::Active(_))
    }

    pub fn state(&self) -> QueueState {
        match self {
            QueueStatus::Idle { .. } => QueueState::Idle,
            QueueStatus::Completed { .. } => QueueState::Completed,
            QueueStatus::Active(_) => QueueState::Active,
        }
    }

    pub fn as_active(&self) -> Option<&ActiveStatus> {
        match self {
            QueueStatus::Active(active) => Some(active),
            _ => None,
        }
    }

    /// Short headline for the status
    pub fn message(&self) -> String {
        match self {
            QueueStatus::Idle { message } | QueueStatus::Completed { message, .. } => {
                message.clone()
            }
            QueueStatus::Active(active) => format!(
                "Estimated completion time: {}",
                active.projected_finish_display
            ),
        }
    }
}

/// Result of reporting a new queue size
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The update was applied (or was an unchanged-size no-op)
    Status(QueueStatus),
    /// There is no active queue to update
    NotActive,
}

impl UpdateOutcome {
    pub fn is_not_active(&self) -> bool {
        matches!(self, UpdateOutcome::NotActive)
    }

    /// Convert into a status, mapping the inactive signal to `QueueError::NotActive`
    pub fn into_status(self) -> Result<QueueStatus> {
        match self {
            UpdateOutcome::Status(status) => Ok(status),
            UpdateOutcome::NotActive => Err(QueueError::NotActive.into()),
        }
    }
}

/// Historical summary for a single boss
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BossStats {
    pub boss_id: BossId,
    pub total_runs_started: u32,
    pub completed_run_count: usize,
    pub average_per_unit_seconds: f64,
    pub average_per_unit_display: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_outcome_not_active_maps_to_error() {
        let err = UpdateOutcome::NotActive.into_status().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<QueueError>(),
            Some(QueueError::NotActive)
        ));
    }

    #[test]
    fn test_idle_status_shape() {
        let status = QueueStatus::Idle {
            message: "no active queue".to_string(),
        };
        assert!(!status.is_active());
        assert_eq!(status.state(), QueueState::Idle);
        assert!(status.as_active().is_none());

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "idle");
        assert_eq!(json["message"], "no active queue");
    }

    #[test]
    fn test_observation_serializes_epoch_millis() {
        let time = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let json = serde_json::to_string(&Observation::new(time, 12)).unwrap();
        assert_eq!(json, r#"{"time":1700000000123,"size":12}"#);
    }
}
