//! Installment engine errors

use lombard_core::Money;
use thiserror::Error;
use uuid::Uuid;

/// Business-rule failures of the installment state machine
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InstallmentError {
    #[error("Installment {installment_id} is already paid")]
    AlreadyPaid { installment_id: Uuid },

    #[error("Installment {installment_id} was dropped by liquidation")]
    Dropped { installment_id: Uuid },

    #[error("Installment {installment_id} has no penalty to waive")]
    NoPenaltyToWaive { installment_id: Uuid },

    #[error("Cannot split {amount} into {count} installments")]
    InvalidSchedule { amount: Money, count: u32 },
}
