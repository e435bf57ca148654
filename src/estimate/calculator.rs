//! Per-person service time calculation
//!
//! This module derives the service rate of a queue from its observation
//! history and damps it against the previous estimate so a single noisy
//! report cannot swing the projection wildly.

use crate::error::QueueError;
use crate::types::{Observation, QueueSize};
use crate::utils::{add_seconds, seconds_between};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Longest horizon a finish time is projected into (100 years)
pub const MAX_PROJECTION_SECONDS: f64 = 100.0 * 365.25 * 86_400.0;

/// Configuration for rate estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Estimate used when a boss has no completed runs
    pub default_per_unit_seconds: f64,
    /// Lowest estimate ever reported
    pub min_per_unit_seconds: f64,
    /// Highest estimate ever reported
    pub max_per_unit_seconds: f64,
    /// Weight of the freshly measured rate when blending with the previous estimate
    pub recent_weight: f64,
    /// Seed estimates from, and record completions into, per-boss history
    pub track_boss_history: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            default_per_unit_seconds: 60.0, // 1 minute per person
            min_per_unit_seconds: 10.0,
            max_per_unit_seconds: 86_400.0, // 1 day per person
            recent_weight: 0.7,
            track_boss_history: true,
        }
    }
}

impl EstimatorConfig {
    /// Plain tracker that ignores boss history entirely
    pub fn without_history() -> Self {
        Self {
            track_boss_history: false,
            ..Self::default()
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(self.min_per_unit_seconds.is_finite() && self.min_per_unit_seconds > 0.0) {
            return Err(QueueError::ConfigurationError {
                message: "min_per_unit_seconds must be positive".to_string(),
            }
            .into());
        }

        if !self.default_per_unit_seconds.is_finite()
            || self.default_per_unit_seconds < self.min_per_unit_seconds
        {
            return Err(QueueError::ConfigurationError {
                message: "default_per_unit_seconds must be at least min_per_unit_seconds"
                    .to_string(),
            }
            .into());
        }

        if !self.max_per_unit_seconds.is_finite()
            || self.max_per_unit_seconds < self.default_per_unit_seconds
        {
            return Err(QueueError::ConfigurationError {
                message: "max_per_unit_seconds must be at least default_per_unit_seconds"
                    .to_string(),
            }
            .into());
        }

        if !(self.recent_weight > 0.0 && self.recent_weight <= 1.0) {
            return Err(QueueError::ConfigurationError {
                message: "recent_weight must be in (0, 1]".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Aggregate of every decreasing step in an observation history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSample {
    pub elapsed_seconds: f64,
    pub people_served: u64,
}

impl RateSample {
    /// Raw seconds per person, before damping
    pub fn per_unit_seconds(&self) -> f64 {
        self.elapsed_seconds / self.people_served as f64
    }
}

/// Damped rate estimator
#[derive(Debug, Clone)]
pub struct RateCalculator {
    config: EstimatorConfig,
}

impl RateCalculator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Sum time and people over consecutive pairs where the queue shrank.
    ///
    /// Growth and pairs without elapsed time are noise and are skipped.
    pub fn sample(&self, observations: &[Observation]) -> Option<RateSample> {
        let mut elapsed_seconds = 0.0;
        let mut people_served: u64 = 0;

        for pair in observations.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            let time_diff = seconds_between(prev.time, curr.time);

            if curr.size < prev.size && time_diff > 0.0 {
                elapsed_seconds += time_diff;
                people_served += u64::from(prev.size - curr.size);
            }
        }

        if people_served == 0 {
            return None;
        }

        Some(RateSample {
            elapsed_seconds,
            people_served,
        })
    }

    /// Next per-person estimate, or `None` when the history has no decreasing step
    pub fn next_estimate(&self, previous: f64, observations: &[Observation]) -> Option<f64> {
        let sample = self.sample(observations)?;
        let instantaneous = sample.per_unit_seconds();

        let blended = if previous > 0.0 {
            self.config.recent_weight * instantaneous
                + (1.0 - self.config.recent_weight) * previous
        } else {
            instantaneous
        };

        let estimate = self.bound_estimate(blended);

        debug!(
            "Rate estimate: instantaneous {:.2}s over {} people, previous {:.2}s, new {:.2}s",
            instantaneous, sample.people_served, previous, estimate
        );

        Some(estimate)
    }

    /// Clamp an estimate into `[min, max]`; non-finite or non-positive values become the default
    pub fn bound_estimate(&self, per_unit_seconds: f64) -> f64 {
        if !(per_unit_seconds.is_finite() && per_unit_seconds > 0.0) {
            return self.config.default_per_unit_seconds;
        }

        per_unit_seconds
            .max(self.config.min_per_unit_seconds)
            .min(self.config.max_per_unit_seconds)
    }

    /// Projected finish: `now + size * estimate`, substituting the default for a non-positive estimate.
    ///
    /// The horizon is capped at [`MAX_PROJECTION_SECONDS`].
    pub fn project_finish(
        &self,
        now: DateTime<Utc>,
        size: QueueSize,
        per_unit_seconds: f64,
    ) -> DateTime<Utc> {
        let per_unit = if per_unit_seconds.is_finite() && per_unit_seconds > 0.0 {
            per_unit_seconds
        } else {
            self.config.default_per_unit_seconds
        };

        let horizon = (f64::from(size) * per_unit).min(MAX_PROJECTION_SECONDS);
        add_seconds(now, horizon)
    }
}

impl Default for RateCalculator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}
