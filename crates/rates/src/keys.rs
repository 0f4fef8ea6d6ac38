//! Well-known rate keys
//!
//! Rates are addressed by string key, matching the platform
//! configuration naming.

/// Penalty percentage charged on the outstanding balance at forced
/// liquidation.
pub const PENALTY_RATE: &str = "rates.penalty_rate";

/// Percentage of collateral value that may be drawn as credit.
pub const FINANCING_PERCENTAGE: &str = "limits.financing_percentage";

/// Yield rate applied to collateral by the (out-of-scope) accrual job.
pub const COLLATERAL_YIELD_RATE: &str = "rates.collateral_yield_rate";
