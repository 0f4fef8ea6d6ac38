//! Rate provider errors

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RateError {
    #[error("Rate key not configured: {key}")]
    KeyNotFound { key: String },

    #[error("Rate {key} has invalid value {value}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: &'static str,
    },
}
