//! Error types for the work store.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while consuming from the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store stayed empty for {0:?}")]
    ConsumeTimedOut(Duration),
}
