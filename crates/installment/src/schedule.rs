//! Amortization schedule generation

use crate::error::InstallmentError;
use chrono::{DateTime, Duration, Utc};
use lombard_core::Money;
use lombard_ledger::Installment;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Generate `count` PENDING installments for a financing.
///
/// Each installment is `round2(amount / count)`; the last installment
/// absorbs the rounding remainder so the schedule sums exactly to
/// `amount`. Due dates are spaced `interval_days` apart starting at
/// `first_due`.
pub fn build_schedule(
    financing_id: Uuid,
    amount: Money,
    count: u32,
    first_due: DateTime<Utc>,
    interval_days: i64,
) -> Result<Vec<Installment>, InstallmentError> {
    if count == 0 {
        return Err(InstallmentError::InvalidSchedule { amount, count });
    }

    let per = Money::new(amount.value() / Decimal::from(count))
        .map_err(|_| InstallmentError::InvalidSchedule { amount, count })?;

    // amount - per * (count - 1); negative means the amount is too
    // small to split across this many installments
    let head_total = Money::new(per.value() * Decimal::from(count - 1))
        .map_err(|_| InstallmentError::InvalidSchedule { amount, count })?;
    let last = amount
        .checked_sub(head_total)
        .ok_or(InstallmentError::InvalidSchedule { amount, count })?;

    let installments = (1..=count)
        .map(|number| {
            let due = first_due + Duration::days(interval_days * i64::from(number - 1));
            let installment_amount = if number == count { last } else { per };
            Installment::new(financing_id, number, installment_amount, due)
        })
        .collect();

    Ok(installments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lombard_ledger::InstallmentStatus;
    use rust_decimal_macros::dec;

    fn money(d: Decimal) -> Money {
        Money::new(d).unwrap()
    }

    fn total(installments: &[Installment]) -> Decimal {
        installments.iter().map(|i| i.amount.value()).sum()
    }

    #[test]
    fn test_even_split() {
        let schedule =
            build_schedule(Uuid::new_v4(), money(dec!(3000)), 3, Utc::now(), 30).unwrap();
        assert_eq!(schedule.len(), 3);
        assert!(schedule.iter().all(|i| i.amount.value() == dec!(1000)));
        assert!(schedule.iter().all(|i| i.status == InstallmentStatus::Pending));
        assert_eq!(schedule[0].number, 1);
        assert_eq!(schedule[2].number, 3);
    }

    #[test]
    fn test_last_installment_absorbs_remainder() {
        let schedule = build_schedule(Uuid::new_v4(), money(dec!(100)), 3, Utc::now(), 30).unwrap();
        assert_eq!(schedule[0].amount.value(), dec!(33.33));
        assert_eq!(schedule[1].amount.value(), dec!(33.33));
        assert_eq!(schedule[2].amount.value(), dec!(33.34));
        assert_eq!(total(&schedule), dec!(100));
    }

    #[test]
    fn test_due_dates_spaced_by_interval() {
        let first = Utc::now();
        let schedule = build_schedule(Uuid::new_v4(), money(dec!(900)), 3, first, 30).unwrap();
        assert_eq!(schedule[0].due_date, first);
        assert_eq!(schedule[1].due_date, first + Duration::days(30));
        assert_eq!(schedule[2].due_date, first + Duration::days(60));
    }

    #[test]
    fn test_zero_count_rejected() {
        let result = build_schedule(Uuid::new_v4(), money(dec!(1000)), 0, Utc::now(), 30);
        assert!(matches!(result, Err(InstallmentError::InvalidSchedule { .. })));
    }

    #[test]
    fn test_amount_too_small_to_split() {
        // 0.05 over 10 installments would need a negative tail
        let result = build_schedule(Uuid::new_v4(), money(dec!(0.05)), 10, Utc::now(), 30);
        assert!(matches!(result, Err(InstallmentError::InvalidSchedule { .. })));
    }

    #[test]
    fn test_sum_always_matches_amount() {
        for (amount, count) in [
            (dec!(1000), 7u32),
            (dec!(999.99), 12),
            (dec!(0.03), 3),
            (dec!(50000), 48),
        ] {
            let schedule =
                build_schedule(Uuid::new_v4(), money(amount), count, Utc::now(), 30).unwrap();
            assert_eq!(total(&schedule), amount, "amount {amount} count {count}");
        }
    }
}
