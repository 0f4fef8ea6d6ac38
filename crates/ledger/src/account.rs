//! AccountBalance - per-user balance credited by liquidation payouts

use lombard_core::Money;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single numeric balance per user.
///
/// The financing core only ever credits this balance (liquidation
/// surplus, investment payout); debits belong to other verticals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub user_id: Uuid,
    pub balance: Money,
    /// Optimistic concurrency token, bumped on every update
    pub version: i64,
}

impl AccountBalance {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            balance: Money::ZERO,
            version: 0,
        }
    }
}
