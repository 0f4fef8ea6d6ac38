//! Liquidation outcome summary

use lombard_core::Money;
use serde::{Deserialize, Serialize};

/// Figures returned to the operator after a forced liquidation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationSummary {
    /// Outstanding balance settled from collateral
    pub debt_paid: Money,
    /// Penalty charged on top of the debt
    pub penalty_charged: Money,
    /// `debt_paid + penalty_charged`
    pub total_deducted: Money,
    /// Collateral surplus credited to the user's account
    pub returned_to_user: Money,
}
