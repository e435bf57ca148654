//! Completion-time estimation for shrinking queues
//!
//! This module turns a stream of queue-size observations into a damped
//! per-person service time, a projected finish time, and per-boss
//! historical averages.

pub mod calculator;
pub mod statistics;
pub mod status;
pub mod tracker;

// Re-export commonly used types
pub use calculator::{EstimatorConfig, RateCalculator, RateSample};
pub use statistics::{BossHistory, BossHistoryBook, CompletedRun};
pub use status::StatusFormatter;
pub use tracker::QueueEstimator;
