//! Service layer for raid-queue
//!
//! This module contains the persisted queue service that the presentation
//! layer drives, and the status refresh task that keeps time fields current
//! while a queue is active.

pub mod app;
pub mod refresh;

pub use app::QueueService;
pub use refresh::{run_status_refresh, spawn_status_refresh};
