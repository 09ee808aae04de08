//! Per-chat activity tracking
//!
//! Keeps one record per user or group id in SQLite. Records feed the admin
//! usage report and the broadcast recipient list.

mod models;
mod store;

pub use models::{ActivityRecord, ActivityStats};
pub use store::ActivityStore;

use thiserror::Error;

/// Errors raised by the activity store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database lock poisoned")]
    Poisoned,
    #[error("invalid timestamp stored for {0}")]
    InvalidTimestamp(i64),
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
