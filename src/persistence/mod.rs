//! Durable storage for estimator state
//!
//! This module defines the single-blob store interface, the JSON snapshot
//! format, and best-effort save/load helpers that never let a storage
//! failure disturb the in-memory estimator.

pub mod snapshot;
pub mod store;

// Re-export commonly used types
pub use snapshot::{load_snapshot, save_snapshot, QueueSnapshot};
pub use store::{FileStore, InMemoryStore, PersistenceStore, DEFAULT_STORE_KEY};
