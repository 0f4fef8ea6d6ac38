//! Financing lifecycle errors
//!
//! Aggregates the taxonomy surfaced to operators: validation,
//! business-rule preconditions (with the computed figures), transient
//! concurrency conflicts, and integrity failures. Every error aborts
//! the whole atomic unit; nothing partial is ever persisted.

use lombard_audit::AuditError;
use lombard_core::{Money, MoneyError};
use lombard_credit::CreditError;
use lombard_installment::InstallmentError;
use lombard_ledger::StoreError;
use lombard_rates::RateError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum FinancingError {
    #[error("Investment {0} is not active")]
    InvestmentNotActive(Uuid),

    #[error("Financing {0} is not active")]
    FinancingNotActive(Uuid),

    #[error("Financing {0} has no outstanding balance to liquidate")]
    NothingToLiquidate(Uuid),

    #[error("Insufficient collateral: value {collateral}, required {required} (shortfall {shortfall})")]
    InsufficientCollateral {
        collateral: Money,
        required: Money,
        shortfall: Money,
    },

    #[error("{count} active financing(s) still attached to investment {investment_id}")]
    ActiveFinancingsExist { investment_id: Uuid, count: u32 },

    #[error(transparent)]
    Credit(#[from] CreditError),

    #[error(transparent)]
    Installment(#[from] InstallmentError),

    #[error(transparent)]
    Rate(#[from] RateError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Audit emission failed: {0}")]
    Audit(#[from] AuditError),

    #[error("Invalid money value: {0}")]
    Money(#[from] MoneyError),
}

impl FinancingError {
    /// True for transient conflicts the caller should retry
    /// (concurrent modification of the same entity).
    pub fn is_retryable(&self) -> bool {
        matches!(self, FinancingError::Store(e) if e.is_retryable())
    }
}
