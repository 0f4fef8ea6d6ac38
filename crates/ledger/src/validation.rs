//! Invariant checks run before committing an atomic unit
//!
//! The lifecycle engine calls these after mutating entities and before
//! the transaction commits; a violation aborts the whole unit.

use crate::error::StoreError;
use crate::financing::Financing;
use crate::installment::Installment;
use crate::investment::Investment;
use lombard_core::Money;

/// `credit_used <= credit_limit` must hold for every investment.
pub fn check_credit_invariant(inv: &Investment) -> Result<(), StoreError> {
    if inv.credit_used > inv.credit_limit {
        return Err(StoreError::InvariantViolation {
            entity: "investment",
            id: inv.id.to_string(),
            detail: format!(
                "credit_used {} exceeds credit_limit {}",
                inv.credit_used, inv.credit_limit
            ),
        });
    }
    Ok(())
}

/// While a financing is ACTIVE, `remaining` must equal the sum of
/// `total_due` over its outstanding (non-PAID, non-DROPPED) installments.
pub fn check_remaining_invariant(
    fin: &Financing,
    installments: &[Installment],
) -> Result<(), StoreError> {
    if !fin.is_active() {
        return Ok(());
    }
    let outstanding = installments
        .iter()
        .filter(|i| i.is_outstanding())
        .try_fold(Money::ZERO, |acc, i| acc.checked_add(i.total_due))
        .ok_or_else(|| StoreError::InvariantViolation {
            entity: "financing",
            id: fin.id.to_string(),
            detail: "outstanding total overflow".to_string(),
        })?;
    if outstanding != fin.remaining {
        return Err(StoreError::InvariantViolation {
            entity: "financing",
            id: fin.id.to_string(),
            detail: format!(
                "remaining {} does not match outstanding installment total {}",
                fin.remaining, outstanding
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financing::FinancingStatus;
    use crate::installment::InstallmentStatus;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn money(d: rust_decimal::Decimal) -> Money {
        Money::new(d).unwrap()
    }

    #[test]
    fn test_credit_invariant_holds() {
        let mut inv = Investment::new(Uuid::new_v4(), money(dec!(100000)), money(dec!(15000)));
        inv.credit_used = money(dec!(15000));
        assert!(check_credit_invariant(&inv).is_ok());

        inv.credit_used = money(dec!(15000.01));
        assert!(matches!(
            check_credit_invariant(&inv),
            Err(StoreError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn test_remaining_invariant_counts_outstanding_only() {
        let fin_id = Uuid::new_v4();
        let mut fin = Financing::new(Uuid::new_v4(), Uuid::new_v4(), money(dec!(3000)), 3, money(dec!(1000)));
        fin.remaining = money(dec!(2000));

        let mut paid = Installment::new(fin_id, 1, money(dec!(1000)), Utc::now());
        paid.status = InstallmentStatus::Paid;
        let pending = Installment::new(fin_id, 2, money(dec!(1000)), Utc::now());
        let mut overdue = Installment::new(fin_id, 3, money(dec!(1000)), Utc::now());
        overdue.status = InstallmentStatus::Overdue;

        let all = vec![paid, pending, overdue];
        assert!(check_remaining_invariant(&fin, &all).is_ok());

        fin.remaining = money(dec!(1500));
        assert!(matches!(
            check_remaining_invariant(&fin, &all),
            Err(StoreError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn test_remaining_invariant_skipped_for_terminal() {
        let mut fin = Financing::new(Uuid::new_v4(), Uuid::new_v4(), money(dec!(3000)), 3, money(dec!(1000)));
        fin.status = FinancingStatus::Liquidated;
        fin.remaining = Money::ZERO;
        // No installments supplied; terminal financings are not checked
        assert!(check_remaining_invariant(&fin, &[]).is_ok());
    }
}
