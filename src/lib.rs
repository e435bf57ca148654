//! Raid Queue - completion-time estimator for shrinking raid boss queues
//!
//! This crate turns periodic queue-size reports into a damped per-person
//! service time and a projected finish time, keeps per-boss historical
//! averages, and persists everything so a session survives a restart.

pub mod clock;
pub mod config;
pub mod error;
pub mod estimate;
pub mod persistence;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{QueueError, Result};
pub use types::*;

// Re-export key components
pub use clock::{Clock, ManualClock, SystemClock};
pub use estimate::{EstimatorConfig, QueueEstimator};
pub use persistence::{FileStore, InMemoryStore, PersistenceStore, QueueSnapshot};
pub use service::QueueService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
