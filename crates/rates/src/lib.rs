//! Lombard Rate Provider
//!
//! Supplies current numeric configuration to the financing engine:
//! penalty rate, financing percentage, collateral yield rate. Read-only
//! from the engine's perspective. `StaticRates` serves fixed values for
//! tests and local runs; production wires a provider backed by the
//! platform configuration service.

mod error;
mod keys;
mod provider;
mod statics;

pub use error::RateError;
pub use keys::{COLLATERAL_YIELD_RATE, FINANCING_PERCENTAGE, PENALTY_RATE};
pub use provider::RateProvider;
pub use statics::StaticRates;
