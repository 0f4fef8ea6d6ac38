//! Lombard Credit Engine
//!
//! Keeps `credit_limit`/`credit_used` consistent with collateral value
//! and outstanding draws. Pure functions over the Investment entity;
//! persistence and atomicity belong to the lifecycle engine.

mod engine;
mod error;

pub use engine::{adjust_value, credit_limit_for, release, reserve};
pub use error::CreditError;
