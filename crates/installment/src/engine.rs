//! Installment state machine
//!
//! PENDING -> {PAID, OVERDUE, DROPPED}; OVERDUE -> {PAID, DROPPED}.
//! PAID and DROPPED are terminal; a due-date extension forces OVERDUE
//! back to PENDING. The OVERDUE rollover itself is an external job.

use crate::error::InstallmentError;
use chrono::{DateTime, Utc};
use lombard_core::Money;
use lombard_ledger::{Installment, InstallmentStatus};

/// Mark an installment paid.
///
/// Requires PENDING or OVERDUE status.
pub fn pay(ins: &mut Installment, now: DateTime<Utc>) -> Result<(), InstallmentError> {
    match ins.status {
        InstallmentStatus::Pending | InstallmentStatus::Overdue => {
            ins.status = InstallmentStatus::Paid;
            ins.paid_at = Some(now);
            Ok(())
        }
        InstallmentStatus::Paid => Err(InstallmentError::AlreadyPaid {
            installment_id: ins.id,
        }),
        InstallmentStatus::Dropped => Err(InstallmentError::Dropped {
            installment_id: ins.id,
        }),
    }
}

/// Waive an assessed penalty, returning the waived amount.
///
/// Requires `penalty_amount > 0`. `total_due` is recomputed together
/// with the penalty; status is not touched.
pub fn waive_penalty(ins: &mut Installment) -> Result<Money, InstallmentError> {
    if ins.penalty_amount.is_zero() {
        return Err(InstallmentError::NoPenaltyToWaive {
            installment_id: ins.id,
        });
    }
    let waived = ins.penalty_amount;
    ins.penalty_amount = Money::ZERO;
    ins.total_due = ins.amount;
    Ok(waived)
}

/// Move the due date, clearing OVERDUE back to PENDING.
///
/// Terminal installments cannot be extended.
pub fn extend_due_date(
    ins: &mut Installment,
    new_date: DateTime<Utc>,
) -> Result<(), InstallmentError> {
    match ins.status {
        InstallmentStatus::Paid => Err(InstallmentError::AlreadyPaid {
            installment_id: ins.id,
        }),
        InstallmentStatus::Dropped => Err(InstallmentError::Dropped {
            installment_id: ins.id,
        }),
        InstallmentStatus::Pending | InstallmentStatus::Overdue => {
            ins.due_date = new_date;
            ins.status = InstallmentStatus::Pending;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn installment(status: InstallmentStatus, penalty: rust_decimal::Decimal) -> Installment {
        let mut ins = Installment::new(
            Uuid::new_v4(),
            1,
            Money::new(dec!(1000)).unwrap(),
            Utc::now(),
        );
        ins.status = status;
        if !penalty.is_zero() {
            ins.penalty_amount = Money::new(penalty).unwrap();
            ins.total_due = ins.amount.checked_add(ins.penalty_amount).unwrap();
        }
        ins
    }

    #[test]
    fn test_pay_pending() {
        let mut ins = installment(InstallmentStatus::Pending, dec!(0));
        let now = Utc::now();
        pay(&mut ins, now).unwrap();
        assert_eq!(ins.status, InstallmentStatus::Paid);
        assert_eq!(ins.paid_at, Some(now));
    }

    #[test]
    fn test_pay_overdue() {
        let mut ins = installment(InstallmentStatus::Overdue, dec!(50));
        pay(&mut ins, Utc::now()).unwrap();
        assert_eq!(ins.status, InstallmentStatus::Paid);
        // Penalty still owed: paying settles total_due, not just the base
        assert_eq!(ins.total_due.value(), dec!(1050));
    }

    #[test]
    fn test_pay_paid_rejected() {
        let mut ins = installment(InstallmentStatus::Paid, dec!(0));
        let result = pay(&mut ins, Utc::now());
        assert!(matches!(result, Err(InstallmentError::AlreadyPaid { .. })));
    }

    #[test]
    fn test_pay_dropped_rejected() {
        let mut ins = installment(InstallmentStatus::Dropped, dec!(0));
        let result = pay(&mut ins, Utc::now());
        assert!(matches!(result, Err(InstallmentError::Dropped { .. })));
    }

    #[test]
    fn test_waive_penalty() {
        let mut ins = installment(InstallmentStatus::Overdue, dec!(75.50));
        let waived = waive_penalty(&mut ins).unwrap();
        assert_eq!(waived.value(), dec!(75.50));
        assert_eq!(ins.penalty_amount, Money::ZERO);
        assert_eq!(ins.total_due, ins.amount);
        // Status untouched
        assert_eq!(ins.status, InstallmentStatus::Overdue);
    }

    #[test]
    fn test_waive_without_penalty_rejected() {
        let mut ins = installment(InstallmentStatus::Pending, dec!(0));
        let result = waive_penalty(&mut ins);
        assert!(matches!(result, Err(InstallmentError::NoPenaltyToWaive { .. })));
    }

    #[test]
    fn test_extend_clears_overdue() {
        let mut ins = installment(InstallmentStatus::Overdue, dec!(0));
        let new_date = Utc::now() + Duration::days(14);
        extend_due_date(&mut ins, new_date).unwrap();
        assert_eq!(ins.status, InstallmentStatus::Pending);
        assert_eq!(ins.due_date, new_date);
    }

    #[test]
    fn test_extend_paid_rejected() {
        let mut ins = installment(InstallmentStatus::Paid, dec!(0));
        let result = extend_due_date(&mut ins, Utc::now());
        assert!(matches!(result, Err(InstallmentError::AlreadyPaid { .. })));
    }

    #[test]
    fn test_extend_dropped_rejected() {
        let mut ins = installment(InstallmentStatus::Dropped, dec!(0));
        let result = extend_due_date(&mut ins, Utc::now());
        assert!(matches!(result, Err(InstallmentError::Dropped { .. })));
    }
}
