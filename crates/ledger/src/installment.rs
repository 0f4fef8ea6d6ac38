//! Installment - one scheduled repayment unit of a Financing

use chrono::{DateTime, Utc};
use lombard_core::Money;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Per-installment state.
///
/// PENDING -> {PAID, OVERDUE, DROPPED}; OVERDUE -> {PAID, DROPPED}.
/// A due-date extension forces OVERDUE back to PENDING. PAID and
/// DROPPED are terminal. The PENDING -> OVERDUE rollover is driven by
/// an external scheduled job, not by this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Overdue,
    Dropped,
}

impl InstallmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, InstallmentStatus::Paid | InstallmentStatus::Dropped)
    }

    /// Still owed: counts toward the parent financing's `remaining`.
    pub fn is_outstanding(&self) -> bool {
        !self.is_terminal()
    }
}

/// One scheduled repayment unit of a Financing.
///
/// # Invariants
/// - exactly one installment per `number` per financing (1-based)
/// - `total_due = amount + penalty_amount`, always recomputed together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: Uuid,
    pub financing_id: Uuid,
    /// 1-based position within the schedule
    pub number: u32,
    /// Base due amount
    pub amount: Money,
    pub penalty_amount: Money,
    /// `amount + penalty_amount`
    pub total_due: Money,
    pub due_date: DateTime<Utc>,
    pub status: InstallmentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency token, bumped on every update
    pub version: i64,
}

impl Installment {
    /// Create a PENDING installment with no penalty.
    pub fn new(financing_id: Uuid, number: u32, amount: Money, due_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            financing_id,
            number,
            amount,
            penalty_amount: Money::ZERO,
            total_due: amount,
            due_date,
            status: InstallmentStatus::Pending,
            paid_at: None,
            version: 0,
        }
    }

    pub fn is_outstanding(&self) -> bool {
        self.status.is_outstanding()
    }
}
