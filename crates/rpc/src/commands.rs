//! CLI commands
//!
//! Request-boundary handlers: validate operator input (non-empty
//! reason, well-formed amounts) before the engine runs, then report the
//! outcome. Precondition failures surface the engine's computed figures
//! verbatim.

use chrono::{DateTime, Duration, Utc};
use lombard_core::{ActionContext, Money};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::context::AppContext;

/// Validation: every mutating call needs a non-empty reason.
pub fn action_context(
    operator_id: &str,
    operator_name: &str,
    reason: &str,
) -> Result<ActionContext, anyhow::Error> {
    let ctx = ActionContext::new(operator_id, operator_name, reason);
    if !ctx.has_reason() {
        anyhow::bail!("A non-empty --reason is required for every mutating operation");
    }
    Ok(ctx)
}

fn parse_money(amount: Decimal) -> Result<Money, anyhow::Error> {
    Ok(Money::new(amount)?)
}

fn parse_due_date(value: Option<&str>) -> Result<DateTime<Utc>, anyhow::Error> {
    match value {
        Some(s) => Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc)),
        None => Ok(Utc::now() + Duration::days(30)),
    }
}

/// Fund a new collateral investment for a user
pub async fn fund(
    ctx: &mut AppContext,
    user_id: Uuid,
    amount: Decimal,
    action: &ActionContext,
) -> Result<(), anyhow::Error> {
    let principal = parse_money(amount)?;
    let investment = ctx.engine.fund_investment(user_id, principal, action).await?;

    println!(
        "✅ Funded investment {} for {} (value {}, credit limit {})",
        investment.id, user_id, investment.current_value, investment.credit_limit
    );
    Ok(())
}

/// Adjust an investment's collateral value
pub async fn adjust_value(
    ctx: &mut AppContext,
    investment_id: Uuid,
    new_value: Decimal,
    action: &ActionContext,
) -> Result<(), anyhow::Error> {
    let new_value = parse_money(new_value)?;
    let investment = ctx
        .engine
        .adjust_investment_value(investment_id, new_value, action)
        .await?;

    println!(
        "✅ Adjusted investment {} to {} (credit limit {}, credit used {})",
        investment.id, investment.current_value, investment.credit_limit, investment.credit_used
    );
    Ok(())
}

/// Draw a financing against an investment
pub async fn draw(
    ctx: &mut AppContext,
    investment_id: Uuid,
    amount: Decimal,
    installments: u32,
    first_due: Option<&str>,
    action: &ActionContext,
) -> Result<(), anyhow::Error> {
    let amount = parse_money(amount)?;
    let first_due = parse_due_date(first_due)?;
    let (financing, schedule) =
        ctx.engine
            .create_financing(investment_id, amount, installments, first_due, action)?;

    println!(
        "✅ Financing {} drawn: {} over {} installments of {} (first due {})",
        financing.id,
        financing.amount,
        financing.installment_count,
        financing.installment_amount,
        schedule[0].due_date.format("%Y-%m-%d"),
    );
    Ok(())
}

/// Pay one installment
pub async fn pay(
    ctx: &mut AppContext,
    installment_id: Uuid,
    action: &ActionContext,
) -> Result<(), anyhow::Error> {
    let (installment, financing) = ctx.engine.pay_installment(installment_id, action)?;

    if financing.is_active() {
        println!(
            "✅ Installment {}/{} paid ({}); remaining {}",
            installment.number, financing.installment_count, installment.total_due, financing.remaining
        );
    } else {
        println!(
            "✅ Installment {}/{} paid ({}); financing {} COMPLETED",
            installment.number, financing.installment_count, installment.total_due, financing.id
        );
    }
    Ok(())
}

/// Waive an installment's penalty
pub async fn waive(
    ctx: &mut AppContext,
    installment_id: Uuid,
    action: &ActionContext,
) -> Result<(), anyhow::Error> {
    let installment = ctx.engine.waive_penalty(installment_id, action)?;

    println!(
        "✅ Penalty waived on installment {}; total due is now {}",
        installment.id, installment.total_due
    );
    Ok(())
}

/// Extend an installment's due date
pub async fn extend(
    ctx: &mut AppContext,
    installment_id: Uuid,
    new_date: &str,
    action: &ActionContext,
) -> Result<(), anyhow::Error> {
    let new_date = DateTime::parse_from_rfc3339(new_date)?.with_timezone(&Utc);
    let installment = ctx.engine.extend_due_date(installment_id, new_date, action)?;

    println!(
        "✅ Installment {} now due {} (status {})",
        installment.id,
        installment.due_date.format("%Y-%m-%d"),
        installment.status
    );
    Ok(())
}

/// Forcibly liquidate a financing
pub async fn liquidate(
    ctx: &mut AppContext,
    financing_id: Uuid,
    action: &ActionContext,
) -> Result<(), anyhow::Error> {
    let (summary, _, investment) = ctx.engine.force_liquidate(financing_id, action).await?;

    println!(
        "✅ Financing {} liquidated (investment {} closed)",
        financing_id, investment.id
    );
    println!("   debt paid:        {}", summary.debt_paid);
    println!("   penalty charged:  {}", summary.penalty_charged);
    println!("   total deducted:   {}", summary.total_deducted);
    println!("   returned to user: {}", summary.returned_to_user);
    Ok(())
}

/// Liquidate an investment with no active financings
pub async fn liquidate_investment(
    ctx: &mut AppContext,
    investment_id: Uuid,
    action: &ActionContext,
) -> Result<(), anyhow::Error> {
    let (investment, account) = ctx.engine.force_liquidate_investment(investment_id, action)?;

    println!(
        "✅ Investment {} liquidated; {} credited to {} (balance {})",
        investment.id, account.balance, investment.user_id, account.balance
    );
    Ok(())
}

/// Show a financing and its installment schedule
pub async fn show_financing(ctx: &AppContext, financing_id: Uuid) -> Result<(), anyhow::Error> {
    let financing = ctx.engine.store().get_financing(financing_id)?;
    let installments = ctx.engine.store().list_installments(financing_id)?;

    println!(
        "Financing {} [{}] amount {} remaining {}",
        financing.id, financing.status, financing.amount, financing.remaining
    );
    if let Some(due) = financing.next_due_date {
        println!("  next due: {}", due.format("%Y-%m-%d"));
    }
    for ins in installments {
        println!(
            "  #{:<3} {:<8} due {}  amount {}  penalty {}  total {}",
            ins.number,
            ins.status.to_string(),
            ins.due_date.format("%Y-%m-%d"),
            ins.amount,
            ins.penalty_amount,
            ins.total_due
        );
    }
    Ok(())
}

/// Show an investment and the financings drawn against it
pub async fn show_investment(ctx: &AppContext, investment_id: Uuid) -> Result<(), anyhow::Error> {
    let inv = ctx.engine.store().get_investment(investment_id)?;

    println!(
        "Investment {} [{}] value {} limit {} used {}",
        inv.id, inv.status, inv.current_value, inv.credit_limit, inv.credit_used
    );
    for fin in ctx.engine.store().list_financings_for_investment(investment_id)? {
        println!(
            "  financing {} [{}] amount {} remaining {}",
            fin.id, fin.status, fin.amount, fin.remaining
        );
    }
    Ok(())
}

/// Show a user's account balance and transaction history
pub async fn balance(ctx: &AppContext, user_id: Uuid) -> Result<(), anyhow::Error> {
    let balance = ctx
        .engine
        .store()
        .get_account(user_id)?
        .map(|a| a.balance)
        .unwrap_or_default();
    println!("Balance for {}: {}", user_id, balance);

    for rec in ctx.engine.store().list_transactions_for_user(user_id)? {
        println!(
            "  {}  {:<22} {}",
            rec.created_at.format("%Y-%m-%d %H:%M:%S"),
            rec.kind.to_string(),
            rec.amount
        );
    }
    Ok(())
}
