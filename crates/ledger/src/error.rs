//! Ledger store errors

use thiserror::Error;

/// Errors that can occur in ledger store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Concurrent modification of {entity} {id}")]
    Conflict { entity: &'static str, id: String },

    #[error("Corrupt {entity} row {id}: {detail}")]
    Corrupt {
        entity: &'static str,
        id: String,
        detail: String,
    },

    #[error("Invariant violated on {entity} {id}: {detail}")]
    InvariantViolation {
        entity: &'static str,
        id: String,
        detail: String,
    },
}

impl StoreError {
    /// True if the caller may retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}
