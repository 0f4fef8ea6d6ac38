//! Credit-limit computation and draw accounting

use crate::error::CreditError;
use lombard_core::Money;
use lombard_ledger::Investment;
use rust_decimal::Decimal;

/// Compute the credit limit backed by a collateral value:
/// `round2(current_value * financing_percentage / 100)`, half-up.
pub fn credit_limit_for(
    current_value: Money,
    financing_percentage: Decimal,
) -> Result<Money, CreditError> {
    Ok(current_value.percent_of(financing_percentage)?)
}

/// Adjust the collateral value and recompute the credit limit.
///
/// Fails with [`CreditError::CreditViolation`] if the new limit would
/// fall below the amount already drawn. This is a hard precondition;
/// existing draws are never auto-corrected.
pub fn adjust_value(
    inv: &mut Investment,
    new_value: Money,
    financing_percentage: Decimal,
) -> Result<(), CreditError> {
    let new_limit = credit_limit_for(new_value, financing_percentage)?;
    if new_limit < inv.credit_used {
        return Err(CreditError::CreditViolation {
            new_limit,
            credit_used: inv.credit_used,
        });
    }
    inv.current_value = new_value;
    inv.credit_limit = new_limit;
    Ok(())
}

/// Reserve credit for a new draw.
///
/// Fails with [`CreditError::InsufficientCredit`] if the draw would
/// push `credit_used` past `credit_limit`.
pub fn reserve(inv: &mut Investment, draw: Money) -> Result<(), CreditError> {
    let new_used = inv
        .credit_used
        .checked_add(draw)
        .ok_or(CreditError::InsufficientCredit {
            available: inv.available_credit(),
            requested: draw,
        })?;
    if new_used > inv.credit_limit {
        return Err(CreditError::InsufficientCredit {
            available: inv.available_credit(),
            requested: draw,
        });
    }
    inv.credit_used = new_used;
    Ok(())
}

/// Release previously reserved credit. Never goes below zero.
pub fn release(inv: &mut Investment, amount: Money) {
    inv.credit_used = inv.credit_used.saturating_sub(amount);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn money(d: Decimal) -> Money {
        Money::new(d).unwrap()
    }

    fn investment(value: Decimal, limit: Decimal, used: Decimal) -> Investment {
        let mut inv = Investment::new(Uuid::new_v4(), money(value), money(limit));
        inv.credit_used = money(used);
        inv
    }

    #[test]
    fn test_credit_limit_for() {
        // 100000 * 15% = 15000
        let limit = credit_limit_for(money(dec!(100000)), dec!(15)).unwrap();
        assert_eq!(limit, money(dec!(15000)));
    }

    #[test]
    fn test_credit_limit_rounds_half_up() {
        // 1000.33 * 15 / 100 = 150.0495 -> 150.05
        let limit = credit_limit_for(money(dec!(1000.33)), dec!(15)).unwrap();
        assert_eq!(limit, money(dec!(150.05)));
    }

    #[test]
    fn test_adjust_value_recomputes_limit() {
        let mut inv = investment(dec!(100000), dec!(15000), dec!(5000));
        adjust_value(&mut inv, money(dec!(120000)), dec!(15)).unwrap();
        assert_eq!(inv.current_value, money(dec!(120000)));
        assert_eq!(inv.credit_limit, money(dec!(18000)));
        assert_eq!(inv.credit_used, money(dec!(5000)));
    }

    #[test]
    fn test_adjust_value_rejects_over_limit_draws() {
        // credit_limit 10000, credit_used 9000; new value brings the
        // limit to 8000 which is below the outstanding draws
        let mut inv = investment(dec!(66666.67), dec!(10000), dec!(9000));
        let result = adjust_value(&mut inv, money(dec!(53333.33)), dec!(15));
        match result {
            Err(CreditError::CreditViolation { new_limit, credit_used }) => {
                assert_eq!(new_limit, money(dec!(8000)));
                assert_eq!(credit_used, money(dec!(9000)));
            }
            other => panic!("expected CreditViolation, got {other:?}"),
        }
        // Investment unchanged
        assert_eq!(inv.current_value, money(dec!(66666.67)));
        assert_eq!(inv.credit_limit, money(dec!(10000)));
    }

    #[test]
    fn test_reserve_within_limit() {
        let mut inv = investment(dec!(100000), dec!(15000), dec!(0));
        reserve(&mut inv, money(dec!(15000))).unwrap();
        assert_eq!(inv.credit_used, money(dec!(15000)));
        assert_eq!(inv.available_credit(), Money::ZERO);
    }

    #[test]
    fn test_reserve_over_limit_rejected() {
        let mut inv = investment(dec!(100000), dec!(15000), dec!(10000));
        let result = reserve(&mut inv, money(dec!(6000)));
        match result {
            Err(CreditError::InsufficientCredit { available, requested }) => {
                assert_eq!(available, money(dec!(5000)));
                assert_eq!(requested, money(dec!(6000)));
            }
            other => panic!("expected InsufficientCredit, got {other:?}"),
        }
        assert_eq!(inv.credit_used, money(dec!(10000)));
    }

    #[test]
    fn test_release_clamps_at_zero() {
        let mut inv = investment(dec!(100000), dec!(15000), dec!(3000));
        release(&mut inv, money(dec!(2000)));
        assert_eq!(inv.credit_used, money(dec!(1000)));
        release(&mut inv, money(dec!(5000)));
        assert_eq!(inv.credit_used, Money::ZERO);
    }
}
