//! Configuration management for raid-queue
//!
//! This module handles configuration loading from TOML files and environment
//! variables, validation, and default values for the estimator.

pub mod app;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, DisplaySettings, ServiceSettings, StorageSettings};
