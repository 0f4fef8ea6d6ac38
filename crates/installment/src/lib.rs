//! Lombard Installment Engine
//!
//! Owns the per-installment state machine (pay, waive, extend) and
//! amortization schedule generation. The lifecycle engine wraps these
//! in atomic store transactions and propagates the effects to the
//! parent Financing.

mod engine;
mod error;
mod schedule;

pub use engine::{extend_due_date, pay, waive_penalty};
pub use error::InstallmentError;
pub use schedule::build_schedule;
