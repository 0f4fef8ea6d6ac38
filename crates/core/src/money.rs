//! Money - Non-negative decimal wrapper for ledger amounts
//!
//! All ledger amounts in Lombard MUST be non-negative and carry at most
//! 2 fraction digits. Both properties are enforced at the type level:
//! the constructor rejects negative values and rounds half-up to the
//! ledger precision. Money arithmetic never touches binary floating point.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Ledger decimal precision (fraction digits).
pub const LEDGER_SCALE: u32 = 2;

/// Errors that can occur when constructing amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Amount cannot be negative: {0}")]
    Negative(Decimal),

    #[error("Amount overflow")]
    Overflow,
}

/// A non-negative ledger amount with 2 fraction digits.
///
/// # Invariant
/// The inner value is always >= 0 and rounded half-up to [`LEDGER_SCALE`]
/// digits. This is enforced by the constructor.
///
/// # Example
/// ```
/// use lombard_core::Money;
/// use rust_decimal::Decimal;
///
/// let m = Money::new(Decimal::new(10005, 3)).unwrap(); // 10.005
/// assert_eq!(m.value(), Decimal::new(1001, 2));        // rounds half-up to 10.01
///
/// assert!(Money::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero amount constant
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new Money from a Decimal, rounding half-up to the
    /// ledger precision.
    ///
    /// Returns an error if the value is negative.
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value < Decimal::ZERO {
            Err(MoneyError::Negative(value))
        } else {
            Ok(Self(value.round_dp_with_strategy(
                LEDGER_SCALE,
                RoundingStrategy::MidpointAwayFromZero,
            )))
        }
    }

    /// Create Money without validation or rounding.
    ///
    /// # Safety
    /// The caller MUST ensure the value is non-negative and already at
    /// ledger precision. Use only for trusted sources (e.g., rows read
    /// back from validated storage).
    #[inline]
    pub const fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    /// Get the inner Decimal value
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Check if the amount is zero
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Addition surfacing overflow as an error
    pub fn try_add(&self, other: Money) -> Result<Money, MoneyError> {
        self.checked_add(other).ok_or(MoneyError::Overflow)
    }

    /// Checked subtraction - returns None if the result would be negative
    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        let result = self.0.checked_sub(other.0)?;
        if result < Decimal::ZERO {
            None
        } else {
            Some(Money(result))
        }
    }

    /// Subtraction clamped at zero
    pub fn saturating_sub(&self, other: Money) -> Money {
        self.checked_sub(other).unwrap_or(Money::ZERO)
    }

    /// Compute `self * pct / 100`, rounded half-up to ledger precision.
    ///
    /// Used for credit-limit derivation and penalty computation.
    /// Returns an error if `pct` is negative.
    pub fn percent_of(&self, pct: Decimal) -> Result<Money, MoneyError> {
        Money::new(self.0 * pct / Decimal::ONE_HUNDRED)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::ZERO
    }
}
