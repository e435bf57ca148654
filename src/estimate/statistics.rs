//! Per-boss historical averages
//!
//! Every completed run contributes its final per-person estimate to the
//! history of its boss. The mean of those estimates seeds the next run for
//! the same boss.

use crate::types::{BossId, QueueSize};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// A finished queue run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedRun {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finish_time: DateTime<Utc>,
    pub initial_size: QueueSize,
    pub per_unit_estimate_seconds: f64,
    pub total_duration_seconds: f64,
}

/// History for a single boss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BossHistory {
    pub total_runs_started: u32,
    pub average_per_unit_seconds: f64,
    #[serde(default)]
    pub completed_runs: Vec<CompletedRun>,
}

impl BossHistory {
    /// Create empty history; the average holds `default_average` until a run completes
    pub fn new(default_average: f64) -> Self {
        Self {
            total_runs_started: 0,
            average_per_unit_seconds: default_average,
            completed_runs: Vec::new(),
        }
    }

    /// Append a completed run and recompute the mean estimate
    pub fn add_completed_run(&mut self, run: CompletedRun) {
        self.completed_runs.push(run);
        self.recompute_average();
    }

    pub fn completed_run_count(&self) -> usize {
        self.completed_runs.len()
    }

    pub fn has_completed_runs(&self) -> bool {
        !self.completed_runs.is_empty()
    }

    /// Pass every stored estimate through `bound` and recompute the mean
    pub fn bound_estimates<F>(&mut self, bound: F)
    where
        F: Fn(f64) -> f64,
    {
        self.average_per_unit_seconds = bound(self.average_per_unit_seconds);
        for run in &mut self.completed_runs {
            run.per_unit_estimate_seconds = bound(run.per_unit_estimate_seconds);
        }
        self.recompute_average();
    }

    fn recompute_average(&mut self) {
        if self.completed_runs.is_empty() {
            return;
        }

        let total: f64 = self
            .completed_runs
            .iter()
            .map(|run| run.per_unit_estimate_seconds)
            .sum();
        self.average_per_unit_seconds = total / self.completed_runs.len() as f64;
    }
}

/// All boss histories, keyed by boss id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BossHistoryBook {
    entries: HashMap<BossId, BossHistory>,
}

impl BossHistoryBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: HashMap<BossId, BossHistory>) -> Self {
        Self { entries }
    }

    /// Count a new run for `boss_id`, creating its history on first sight
    pub fn register_start(&mut self, boss_id: &str, default_average: f64) -> &BossHistory {
        let history = self
            .entries
            .entry(boss_id.to_string())
            .or_insert_with(|| BossHistory::new(default_average));
        history.total_runs_started += 1;

        debug!(
            "Registered run {} for boss {}",
            history.total_runs_started, boss_id
        );

        history
    }

    /// Record a completed run. Unknown bosses are ignored.
    pub fn record_completion(&mut self, boss_id: &str, run: CompletedRun) -> bool {
        match self.entries.get_mut(boss_id) {
            Some(history) => {
                history.add_completed_run(run);
                debug!(
                    "Boss {} now averages {:.2}s per person over {} runs",
                    boss_id,
                    history.average_per_unit_seconds,
                    history.completed_run_count()
                );
                true
            }
            None => false,
        }
    }

    /// Seed estimate for a new run, available once the boss has a completed run
    pub fn seed_for(&self, boss_id: &str) -> Option<f64> {
        self.entries
            .get(boss_id)
            .filter(|history| history.has_completed_runs())
            .map(|history| history.average_per_unit_seconds)
    }

    /// Apply [`BossHistory::bound_estimates`] to every boss
    pub fn bound_estimates<F>(&mut self, bound: F)
    where
        F: Fn(f64) -> f64,
    {
        for history in self.entries.values_mut() {
            history.bound_estimates(&bound);
        }
    }

    pub fn get(&self, boss_id: &str) -> Option<&BossHistory> {
        self.entries.get(boss_id)
    }

    pub fn entries(&self) -> &HashMap<BossId, BossHistory> {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BossId, &BossHistory)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(per_unit: f64) -> CompletedRun {
        let start = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        CompletedRun {
            start_time: start,
            finish_time: start + chrono::Duration::seconds(300),
            initial_size: 10,
            per_unit_estimate_seconds: per_unit,
            total_duration_seconds: 300.0,
        }
    }

    #[test]
    fn test_new_history_holds_default() {
        let history = BossHistory::new(60.0);
        assert_eq!(history.total_runs_started, 0);
        assert_eq!(history.average_per_unit_seconds, 60.0);
        assert!(!history.has_completed_runs());
    }

    #[test]
    fn test_average_of_completed_runs() {
        let mut history = BossHistory::new(60.0);
        history.add_completed_run(run(30.0));
        assert_eq!(history.average_per_unit_seconds, 30.0);

        history.add_completed_run(run(50.0));
        assert_eq!(history.average_per_unit_seconds, 40.0);
        assert_eq!(history.completed_run_count(), 2);
    }

    #[test]
    fn test_register_start_creates_lazily() {
        let mut book = BossHistoryBook::new();
        assert!(book.is_empty());

        book.register_start("Boss-A", 60.0);
        book.register_start("Boss-A", 60.0);
        book.register_start("Boss-B", 60.0);

        assert_eq!(book.len(), 2);
        assert_eq!(book.get("Boss-A").unwrap().total_runs_started, 2);
        assert_eq!(book.get("Boss-B").unwrap().total_runs_started, 1);
    }

    #[test]
    fn test_seed_requires_completed_run() {
        let mut book = BossHistoryBook::new();
        book.register_start("Boss-A", 60.0);
        assert_eq!(book.seed_for("Boss-A"), None);
        assert_eq!(book.seed_for("Unknown"), None);

        assert!(book.record_completion("Boss-A", run(45.0)));
        assert_eq!(book.seed_for("Boss-A"), Some(45.0));
    }

    #[test]
    fn test_bound_estimates_recomputes_average() {
        let mut history = BossHistory::new(60.0);
        history.add_completed_run(run(-5.0));
        history.add_completed_run(run(30.0));

        let mut book =
            BossHistoryBook::from_entries(HashMap::from([("Boss-A".to_string(), history)]));
        book.bound_estimates(|estimate| {
            if estimate > 0.0 {
                estimate.max(10.0)
            } else {
                60.0
            }
        });

        let history = book.get("Boss-A").unwrap();
        assert_eq!(history.completed_runs[0].per_unit_estimate_seconds, 60.0);
        assert_eq!(history.average_per_unit_seconds, 45.0);
        assert_eq!(book.seed_for("Boss-A"), Some(45.0));
    }

    #[test]
    fn test_record_completion_unknown_boss_is_ignored() {
        let mut book = BossHistoryBook::new();
        assert!(!book.record_completion("Ghost", run(45.0)));
        assert!(book.is_empty());
    }
}
