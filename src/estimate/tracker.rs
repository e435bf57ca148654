//! Queue run state machine
//!
//! [`QueueEstimator`] owns the current run and the per-boss history. Runs
//! move `Idle -> Active -> Completed`; `reset` returns to `Idle` from any
//! state and `start_queue` begins a fresh run from any state.

use crate::clock::{Clock, SystemClock};
use crate::error::{QueueError, Result};
use crate::estimate::calculator::{EstimatorConfig, RateCalculator};
use crate::estimate::statistics::{BossHistoryBook, CompletedRun};
use crate::estimate::status::{round_tenths, StatusFormatter};
use crate::persistence::snapshot::QueueSnapshot;
use crate::types::{
    ActiveStatus, BossId, BossStats, Observation, QueueSize, QueueState, QueueStatus,
    UpdateOutcome,
};
use crate::utils::seconds_between;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

const IDLE_MESSAGE: &str = "no active queue";
const COMPLETE_MESSAGE: &str = "queue complete";

/// One queue run
#[derive(Debug, Clone, PartialEq)]
struct Session {
    boss_id: BossId,
    start_time: DateTime<Utc>,
    /// Projected while active, actual once complete
    finish_time: DateTime<Utc>,
    initial_size: QueueSize,
    current_size: QueueSize,
    /// Never empty; the first entry is the starting observation
    observations: Vec<Observation>,
    per_unit_estimate_seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum TrackerState {
    Idle,
    Active(Session),
    Completed(Session),
}

impl TrackerState {
    fn session(&self) -> Option<&Session> {
        match self {
            TrackerState::Idle => None,
            TrackerState::Active(session) | TrackerState::Completed(session) => Some(session),
        }
    }
}

/// Estimates when a shrinking queue will reach the front
pub struct QueueEstimator {
    calculator: RateCalculator,
    clock: Arc<dyn Clock>,
    formatter: StatusFormatter,
    state: TrackerState,
    history: BossHistoryBook,
}

impl QueueEstimator {
    /// Create an idle estimator with empty history
    pub fn new(config: EstimatorConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            calculator: RateCalculator::new(config),
            clock,
            formatter: StatusFormatter::default(),
            state: TrackerState::Idle,
            history: BossHistoryBook::new(),
        })
    }

    /// Create an estimator driven by the wall clock
    pub fn with_system_clock(config: EstimatorConfig) -> Result<Self> {
        Self::new(config, Arc::new(SystemClock))
    }

    pub fn with_formatter(mut self, formatter: StatusFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn config(&self) -> &EstimatorConfig {
        self.calculator.config()
    }

    pub fn state(&self) -> QueueState {
        match self.state {
            TrackerState::Idle => QueueState::Idle,
            TrackerState::Active(_) => QueueState::Active,
            TrackerState::Completed(_) => QueueState::Completed,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TrackerState::Active(_))
    }

    /// Observations of the current or last completed run
    pub fn observations(&self) -> &[Observation] {
        self.state
            .session()
            .map(|session| session.observations.as_slice())
            .unwrap_or(&[])
    }

    /// Current per-person estimate; the configured default when idle
    pub fn per_unit_estimate_seconds(&self) -> f64 {
        self.state
            .session()
            .map(|session| session.per_unit_estimate_seconds)
            .unwrap_or(self.config().default_per_unit_seconds)
    }

    pub fn current_boss(&self) -> Option<&str> {
        self.state.session().map(|session| session.boss_id.as_str())
    }

    pub fn history(&self) -> &BossHistoryBook {
        &self.history
    }

    /// Begin tracking a new queue run
    pub fn start_queue(&mut self, size: QueueSize, boss_id: &str) -> Result<QueueStatus> {
        if size == 0 {
            return Err(QueueError::invalid_input("queue size must be greater than 0").into());
        }

        let boss_id = boss_id.trim();
        if boss_id.is_empty() {
            return Err(QueueError::invalid_input("a boss must be selected").into());
        }

        let now = self.clock.now();
        let default_estimate = self.config().default_per_unit_seconds;

        let per_unit_estimate_seconds = if self.config().track_boss_history {
            self.history.register_start(boss_id, default_estimate);
            self.history
                .seed_for(boss_id)
                .map(|seed| self.calculator.bound_estimate(seed))
                .unwrap_or(default_estimate)
        } else {
            default_estimate
        };

        if let TrackerState::Active(previous) = &self.state {
            info!(
                "Abandoning active queue for {} at size {}",
                previous.boss_id, previous.current_size
            );
        }

        let session = Session {
            boss_id: boss_id.to_string(),
            start_time: now,
            finish_time: self
                .calculator
                .project_finish(now, size, per_unit_estimate_seconds),
            initial_size: size,
            current_size: size,
            observations: vec![Observation::new(now, size)],
            per_unit_estimate_seconds,
        };

        info!(
            "Started queue for {} with {} people ahead (seed {:.1}s per person)",
            boss_id, size, per_unit_estimate_seconds
        );

        self.state = TrackerState::Active(session);
        Ok(self.status())
    }

    /// Report the latest queue size
    pub fn update_queue(&mut self, size: QueueSize) -> UpdateOutcome {
        let mut session = match std::mem::replace(&mut self.state, TrackerState::Idle) {
            TrackerState::Active(session) => session,
            other => {
                debug!("Ignoring queue update to {}: no active queue", size);
                self.state = other;
                return UpdateOutcome::NotActive;
            }
        };

        if session.current_size == size {
            self.state = TrackerState::Active(session);
            return UpdateOutcome::Status(self.status());
        }

        let now = self.clock.now();
        session.observations.push(Observation::new(now, size));
        session.current_size = size;

        if let Some(estimate) = self
            .calculator
            .next_estimate(session.per_unit_estimate_seconds, &session.observations)
        {
            session.per_unit_estimate_seconds = estimate;
        }

        if size == 0 {
            session.finish_time = now;
            self.record_completion(&session);
            info!(
                "Queue for {} complete after {:.0}s",
                session.boss_id,
                seconds_between(session.start_time, now)
            );
            self.state = TrackerState::Completed(session);
        } else {
            session.finish_time =
                self.calculator
                    .project_finish(now, size, session.per_unit_estimate_seconds);
            debug!(
                "Queue for {} at {} people, {:.1}s per person",
                session.boss_id, size, session.per_unit_estimate_seconds
            );
            self.state = TrackerState::Active(session);
        }

        UpdateOutcome::Status(self.status())
    }

    fn record_completion(&mut self, session: &Session) {
        if !self.config().track_boss_history {
            return;
        }

        let run = CompletedRun {
            start_time: session.start_time,
            finish_time: session.finish_time,
            initial_size: session.initial_size,
            per_unit_estimate_seconds: session.per_unit_estimate_seconds,
            total_duration_seconds: seconds_between(session.start_time, session.finish_time),
        };

        self.history.record_completion(&session.boss_id, run);
    }

    /// Read-only view of the tracker
    pub fn status(&self) -> QueueStatus {
        match &self.state {
            TrackerState::Idle => QueueStatus::Idle {
                message: IDLE_MESSAGE.to_string(),
            },
            TrackerState::Completed(session) => QueueStatus::Completed {
                message: COMPLETE_MESSAGE.to_string(),
                finish_time: session.finish_time,
                finish_time_display: self.formatter.clock(session.finish_time),
                boss_id: session.boss_id.clone(),
            },
            TrackerState::Active(session) => {
                let now = self.clock.now();
                let elapsed_seconds = seconds_between(session.start_time, now);
                let remaining_seconds = seconds_between(now, session.finish_time).max(0.0);
                let per_unit = session.per_unit_estimate_seconds;

                QueueStatus::Active(ActiveStatus {
                    boss_id: session.boss_id.clone(),
                    current_size: session.current_size,
                    initial_size: session.initial_size,
                    start_time: session.start_time,
                    start_time_display: self.formatter.clock(session.start_time),
                    now,
                    now_display: self.formatter.clock(now),
                    elapsed_seconds,
                    elapsed_display: self.formatter.duration(elapsed_seconds),
                    projected_finish_time: session.finish_time,
                    projected_finish_display: self.formatter.clock(session.finish_time),
                    remaining_seconds,
                    remaining_display: self.formatter.duration(remaining_seconds),
                    per_unit_estimate_seconds: per_unit,
                    per_unit_estimate_rounded: round_tenths(per_unit),
                    per_unit_estimate_display: self.formatter.duration(per_unit),
                })
            }
        }
    }

    /// Historical summary for `boss_id`, or the current run's boss when `None`.
    ///
    /// Absent until the boss has at least one completed run.
    pub fn boss_stats(&self, boss_id: Option<&str>) -> Option<BossStats> {
        let boss_id = boss_id.or_else(|| self.current_boss())?;
        let history = self.history.get(boss_id)?;

        if !history.has_completed_runs() {
            return None;
        }

        Some(BossStats {
            boss_id: boss_id.to_string(),
            total_runs_started: history.total_runs_started,
            completed_run_count: history.completed_run_count(),
            average_per_unit_seconds: history.average_per_unit_seconds,
            average_per_unit_display: self.formatter.duration(history.average_per_unit_seconds),
        })
    }

    /// Drop the current run; boss history is kept
    pub fn reset(&mut self) {
        if let Some(session) = self.state.session() {
            info!("Leaving queue for {}", session.boss_id);
        }
        self.state = TrackerState::Idle;
    }

    /// Serializable copy of the full estimator state
    pub fn snapshot(&self) -> QueueSnapshot {
        let boss_history = self.history.entries().clone();

        match &self.state {
            TrackerState::Idle => QueueSnapshot {
                active: false,
                start_time: None,
                finish_time: None,
                initial_size: 0,
                current_size: 0,
                per_unit_estimate_seconds: self.config().default_per_unit_seconds,
                boss_id: None,
                observations: Vec::new(),
                boss_history,
            },
            TrackerState::Active(session) | TrackerState::Completed(session) => QueueSnapshot {
                active: self.is_active(),
                start_time: Some(session.start_time),
                finish_time: Some(session.finish_time),
                initial_size: session.initial_size,
                current_size: session.current_size,
                per_unit_estimate_seconds: session.per_unit_estimate_seconds,
                boss_id: Some(session.boss_id.clone()),
                observations: session.observations.clone(),
                boss_history,
            },
        }
    }

    /// Replace all state with a snapshot.
    ///
    /// The snapshot is fully validated first; on error nothing changes. An
    /// active run gets its finish time re-projected from the current time.
    pub fn restore(&mut self, snapshot: QueueSnapshot) -> Result<()> {
        let state = self.state_from_snapshot(&snapshot)?;

        let mut history = BossHistoryBook::from_entries(snapshot.boss_history);
        history.bound_estimates(|estimate| self.calculator.bound_estimate(estimate));

        self.history = history;
        self.state = state;

        info!(
            "Restored {} queue state with history for {} bosses",
            self.state(),
            self.history.len()
        );

        Ok(())
    }

    fn state_from_snapshot(&self, snapshot: &QueueSnapshot) -> Result<TrackerState> {
        let start_time = match snapshot.start_time {
            Some(start_time) => start_time,
            None if snapshot.active => {
                return Err(QueueError::InvalidSnapshot {
                    reason: "active queue without a start time".to_string(),
                }
                .into())
            }
            None => return Ok(TrackerState::Idle),
        };

        let boss_id = snapshot
            .boss_id
            .as_deref()
            .map(str::trim)
            .filter(|boss_id| !boss_id.is_empty())
            .ok_or_else(|| QueueError::InvalidSnapshot {
                reason: "queue run without a boss".to_string(),
            })?;

        let last_observation = snapshot.observations.last().ok_or_else(|| {
            QueueError::InvalidSnapshot {
                reason: "queue run without observations".to_string(),
            }
        })?;

        if snapshot.per_unit_estimate_seconds > self.config().max_per_unit_seconds {
            return Err(QueueError::InvalidSnapshot {
                reason: format!(
                    "estimate of {}s per person is out of range",
                    snapshot.per_unit_estimate_seconds
                ),
            }
            .into());
        }
        let per_unit_estimate_seconds = self
            .calculator
            .bound_estimate(snapshot.per_unit_estimate_seconds);

        let mut session = Session {
            boss_id: boss_id.to_string(),
            start_time,
            finish_time: snapshot.finish_time.unwrap_or(last_observation.time),
            initial_size: snapshot.initial_size,
            current_size: snapshot.current_size,
            observations: snapshot.observations.clone(),
            per_unit_estimate_seconds,
        };

        if !snapshot.active {
            return Ok(TrackerState::Completed(session));
        }

        if session.current_size == 0 {
            return Err(QueueError::InvalidSnapshot {
                reason: "active queue with nobody ahead".to_string(),
            }
            .into());
        }

        session.finish_time = self.calculator.project_finish(
            self.clock.now(),
            session.current_size,
            session.per_unit_estimate_seconds,
        );

        Ok(TrackerState::Active(session))
    }
}

impl std::fmt::Debug for QueueEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueEstimator")
            .field("config", self.config())
            .field("state", &self.state)
            .field("history", &self.history)
            .finish()
    }
}
