//! Financing - a loan drawn against one Investment's credit limit

use chrono::{DateTime, Utc};
use lombard_core::Money;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Lifecycle status of a Financing.
///
/// COMPLETED and LIQUIDATED are terminal. DEFAULTED is a risk
/// classification written by an external scoring process; this core
/// reads it but never sets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinancingStatus {
    Active,
    Completed,
    Defaulted,
    Liquidated,
}

impl FinancingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FinancingStatus::Completed | FinancingStatus::Liquidated)
    }
}

/// A loan drawn against an Investment, repaid via Installments.
///
/// # Invariant
/// While ACTIVE, `remaining` equals the sum of `total_due` over
/// installments whose status is neither PAID nor DROPPED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Financing {
    pub id: Uuid,
    pub user_id: Uuid,
    pub investment_id: Uuid,
    /// Original principal drawn
    pub amount: Money,
    pub installment_count: u32,
    /// Per-installment base amount (the last installment absorbs
    /// the rounding remainder)
    pub installment_amount: Money,
    /// Outstanding principal + assessed penalties
    pub remaining: Money,
    /// Penalty charged at forced liquidation
    pub penalty_amount: Money,
    pub next_due_date: Option<DateTime<Utc>>,
    pub status: FinancingStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency token, bumped on every update
    pub version: i64,
}

impl Financing {
    /// Create a new ACTIVE financing drawing `amount` against an investment.
    pub fn new(
        user_id: Uuid,
        investment_id: Uuid,
        amount: Money,
        installment_count: u32,
        installment_amount: Money,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            investment_id,
            amount,
            installment_count,
            installment_amount,
            remaining: amount,
            penalty_amount: Money::ZERO,
            next_due_date: None,
            status: FinancingStatus::Active,
            created_at: Utc::now(),
            completed_at: None,
            version: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == FinancingStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_financing_remaining_equals_amount() {
        let amount = Money::new(dec!(3000)).unwrap();
        let per = Money::new(dec!(1000)).unwrap();
        let f = Financing::new(Uuid::new_v4(), Uuid::new_v4(), amount, 3, per);
        assert!(f.is_active());
        assert_eq!(f.remaining, amount);
        assert_eq!(f.penalty_amount, Money::ZERO);
        assert!(f.completed_at.is_none());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(FinancingStatus::Completed.is_terminal());
        assert!(FinancingStatus::Liquidated.is_terminal());
        assert!(!FinancingStatus::Active.is_terminal());
        assert!(!FinancingStatus::Defaulted.is_terminal());
    }

    #[test]
    fn test_status_parse() {
        let s: FinancingStatus = "ACTIVE".parse().unwrap();
        assert_eq!(s, FinancingStatus::Active);
        assert_eq!(FinancingStatus::Liquidated.to_string(), "LIQUIDATED");
    }
}
