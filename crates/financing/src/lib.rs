//! Lombard Financing Lifecycle Engine
//!
//! Orchestrates the multi-entity transitions that move money:
//! financing creation, manual payment, penalty waiver, due-date
//! extension, forced liquidation, and investment liquidation. Every
//! operation executes as one atomic ledger transaction and emits one
//! audit record on success.

mod engine;
mod error;
mod summary;

pub use engine::FinancingEngine;
pub use error::FinancingError;
pub use summary::LiquidationSummary;
