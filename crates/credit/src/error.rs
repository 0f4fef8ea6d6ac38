//! Credit engine errors

use lombard_core::{Money, MoneyError};
use thiserror::Error;

/// Business-rule failures of the credit engine.
///
/// Variants carry the computed figures so the operator understands why
/// the operation was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CreditError {
    #[error("Insufficient credit: available {available}, requested {requested}")]
    InsufficientCredit { available: Money, requested: Money },

    #[error("Value adjustment would leave draws over-limit: new credit limit {new_limit}, credit used {credit_used}")]
    CreditViolation { new_limit: Money, credit_used: Money },

    #[error("Invalid money computation: {0}")]
    Money(#[from] MoneyError),
}
