//! Investment - collateral account backing credit

use chrono::{DateTime, Utc};
use lombard_core::Money;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Lifecycle status of an Investment.
///
/// LIQUIDATED (voluntary) and LIQUIDATED_BY_PENALTY (forced) are
/// terminal; a liquidated investment never backs credit again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestmentStatus {
    Active,
    Liquidated,
    LiquidatedByPenalty,
}

impl InvestmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InvestmentStatus::Liquidated | InvestmentStatus::LiquidatedByPenalty
        )
    }
}

/// A collateral account whose value backs borrowing capacity.
///
/// # Invariants
/// - `credit_used <= credit_limit` at all times
/// - `credit_limit = round2(current_value * financing_percentage / 100)`
///   whenever recomputed (the Credit Engine owns the recomputation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Originally funded collateral
    pub principal: Money,
    /// Present collateral value
    pub current_value: Money,
    /// Maximum total draw, derived from `current_value`
    pub credit_limit: Money,
    /// Outstanding financing principal drawn against this investment
    pub credit_used: Money,
    pub status: InvestmentStatus,
    pub created_at: DateTime<Utc>,
    pub liquidated_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency token, bumped on every update
    pub version: i64,
}

impl Investment {
    /// Create a freshly funded ACTIVE investment.
    pub fn new(user_id: Uuid, principal: Money, credit_limit: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            principal,
            current_value: principal,
            credit_limit,
            credit_used: Money::ZERO,
            status: InvestmentStatus::Active,
            created_at: Utc::now(),
            liquidated_at: None,
            version: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == InvestmentStatus::Active
    }

    /// Credit still available for new draws.
    pub fn available_credit(&self) -> Money {
        self.credit_limit.saturating_sub(self.credit_used)
    }
}
