//! Integration tests for Lombard
//!
//! These exercise the full stack: AppContext wiring, the lifecycle
//! engine, the SQLite ledger, optimistic versioning, and the JSONL
//! audit trail, against the scenarios an operator actually runs.

use chrono::Utc;
use lombard_core::{ActionContext, Money};
use lombard_credit::CreditError;
use lombard_financing::FinancingError;
use lombard_installment::InstallmentError;
use lombard_ledger::{
    check_credit_invariant, check_remaining_invariant, FinancingStatus, InstallmentStatus,
    InvestmentStatus, StoreError, TransactionKind,
};
use lombard_rpc::AppContext;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;
use uuid::Uuid;

fn money(d: Decimal) -> Money {
    Money::new(d).unwrap()
}

fn action(reason: &str) -> ActionContext {
    ActionContext::new("op-1", "Jane Doe", reason)
}

fn app() -> (AppContext, TempDir) {
    let dir = TempDir::new().unwrap();
    let ctx = AppContext::new(dir.path()).unwrap();
    (ctx, dir)
}

fn app_with_financing_pct(pct: Decimal) -> (AppContext, TempDir) {
    let dir = TempDir::new().unwrap();
    let rates = lombard_rates::StaticRates::with_defaults();
    rates.set_rate(lombard_rates::FINANCING_PERCENTAGE, pct);
    let ctx = AppContext::with_rates(dir.path(), rates).unwrap();
    (ctx, dir)
}

/// Fund an investment and draw a financing against it, asserting the
/// credit invariant along the way.
async fn fund_and_draw(
    ctx: &mut AppContext,
    principal: Decimal,
    draw: Decimal,
    installments: u32,
) -> (Uuid, Uuid, Vec<Uuid>) {
    let user = Uuid::new_v4();
    let inv = ctx
        .engine
        .fund_investment(user, money(principal), &action("collateral funded"))
        .await
        .unwrap();
    let (fin, schedule) = ctx
        .engine
        .create_financing(inv.id, money(draw), installments, Utc::now(), &action("draw"))
        .unwrap();

    let stored = ctx.engine.store().get_investment(inv.id).unwrap();
    check_credit_invariant(&stored).unwrap();

    (inv.id, fin.id, schedule.iter().map(|i| i.id).collect())
}

/// Full happy path: fund, draw, pay to completion, voluntary
/// investment liquidation with payout.
#[tokio::test]
async fn test_full_workflow() {
    let (mut ctx, _dir) = app();
    let user = Uuid::new_v4();

    let inv = ctx
        .engine
        .fund_investment(user, money(dec!(100000)), &action("initial funding"))
        .await
        .unwrap();
    assert_eq!(inv.status, InvestmentStatus::Active);
    assert_eq!(inv.credit_limit, money(dec!(15000)));

    let (fin, schedule) = ctx
        .engine
        .create_financing(inv.id, money(dec!(3000)), 3, Utc::now(), &action("customer draw"))
        .unwrap();
    assert_eq!(fin.remaining, money(dec!(3000)));

    // Pay everything
    for ins in &schedule {
        ctx.engine.pay_installment(ins.id, &action("manual payment")).unwrap();
    }

    let fin = ctx.engine.store().get_financing(fin.id).unwrap();
    assert_eq!(fin.status, FinancingStatus::Completed);
    assert_eq!(fin.remaining, Money::ZERO);

    // Credit released, so voluntary liquidation is possible
    let (closed, account) = ctx
        .engine
        .force_liquidate_investment(inv.id, &action("customer exit"))
        .unwrap();
    assert_eq!(closed.status, InvestmentStatus::Liquidated);
    assert_eq!(account.balance, money(dec!(100000)));

    // The money movements are all on the books
    let kinds: Vec<TransactionKind> = ctx
        .engine
        .store()
        .list_transactions_for_user(user)
        .unwrap()
        .iter()
        .map(|t| t.kind)
        .collect();
    assert!(kinds.contains(&TransactionKind::InvestmentFunded));
    assert!(kinds.contains(&TransactionKind::FinancingDrawn));
    assert!(kinds.contains(&TransactionKind::InstallmentPaid));
    assert!(kinds.contains(&TransactionKind::InvestmentLiquidated));
}

/// Invariant: credit_used <= credit_limit after every operation, and
/// remaining matches the outstanding installment total.
#[tokio::test]
async fn test_invariants_hold_through_lifecycle() {
    let (mut ctx, _dir) = app();
    let (inv_id, fin_id, installments) = fund_and_draw(&mut ctx, dec!(100000), dec!(10000), 4).await;

    let assert_invariants = |ctx: &AppContext| {
        let inv = ctx.engine.store().get_investment(inv_id).unwrap();
        check_credit_invariant(&inv).unwrap();
        let fin = ctx.engine.store().get_financing(fin_id).unwrap();
        let all = ctx.engine.store().list_installments(fin_id).unwrap();
        check_remaining_invariant(&fin, &all).unwrap();
    };

    assert_invariants(&ctx);
    ctx.engine
        .pay_installment(installments[0], &action("payment 1"))
        .unwrap();
    assert_invariants(&ctx);
    ctx.engine
        .extend_due_date(
            installments[1],
            Utc::now() + chrono::Duration::days(90),
            &action("hardship extension"),
        )
        .unwrap();
    assert_invariants(&ctx);
    ctx.engine
        .pay_installment(installments[2], &action("payment 3"))
        .unwrap();
    assert_invariants(&ctx);
}

/// Idempotence boundary: paying a PAID installment fails with
/// AlreadyPaid and never double-decrements remaining.
#[tokio::test]
async fn test_already_paid_is_rejected() {
    let (mut ctx, _dir) = app();
    let (_, fin_id, installments) = fund_and_draw(&mut ctx, dec!(100000), dec!(3000), 3).await;

    ctx.engine
        .pay_installment(installments[0], &action("first payment"))
        .unwrap();
    let remaining = ctx.engine.store().get_financing(fin_id).unwrap().remaining;
    assert_eq!(remaining, money(dec!(2000)));

    for _ in 0..3 {
        let result = ctx.engine.pay_installment(installments[0], &action("retry"));
        assert!(matches!(
            result,
            Err(FinancingError::Installment(InstallmentError::AlreadyPaid { .. }))
        ));
    }
    assert_eq!(
        ctx.engine.store().get_financing(fin_id).unwrap().remaining,
        remaining
    );
}

/// Atomicity: a fault between the installment update and the financing
/// update leaves no partial state visible.
#[tokio::test]
async fn test_payment_atomicity_on_midway_fault() {
    let (mut ctx, _dir) = app();
    let (_, fin_id, installments) = fund_and_draw(&mut ctx, dec!(100000), dec!(3000), 3).await;

    // Put the financing in a state that makes the unit fail after the
    // installment row has already been written inside the transaction
    let mut fin = ctx.engine.store().get_financing(fin_id).unwrap();
    fin.status = FinancingStatus::Liquidated;
    ctx.engine
        .store_mut()
        .transaction::<_, StoreError>(|tx| tx.update_financing(&fin))
        .unwrap();

    let result = ctx.engine.pay_installment(installments[0], &action("racing payment"));
    assert!(matches!(result, Err(FinancingError::FinancingNotActive(_))));

    // Neither the installment nor the financing shows any change
    let ins = ctx.engine.store().get_installment(installments[0]).unwrap();
    assert_eq!(ins.status, InstallmentStatus::Pending);
    assert!(ins.paid_at.is_none());
    let fin = ctx.engine.store().get_financing(fin_id).unwrap();
    assert_eq!(fin.remaining, money(dec!(3000)));
}

/// Liquidation surplus: value 100000, remaining 20000, penalty 3% =>
/// penalty 600, total 20600, surplus 79400 credited to the user.
#[tokio::test]
async fn test_liquidation_surplus() {
    let (mut ctx, _dir) = app_with_financing_pct(dec!(25));

    let user = Uuid::new_v4();
    let inv = ctx
        .engine
        .fund_investment(user, money(dec!(100000)), &action("funding"))
        .await
        .unwrap();
    let (fin, _) = ctx
        .engine
        .create_financing(inv.id, money(dec!(20000)), 4, Utc::now(), &action("draw"))
        .unwrap();

    let (summary, _, _) = ctx
        .engine
        .force_liquidate(fin.id, &action("arrears beyond policy"))
        .await
        .unwrap();

    assert_eq!(summary.debt_paid, money(dec!(20000)));
    assert_eq!(summary.penalty_charged, money(dec!(600)));
    assert_eq!(summary.total_deducted, money(dec!(20600)));
    assert_eq!(summary.returned_to_user, money(dec!(79400)));

    assert_eq!(
        ctx.engine.store().get_financing(fin.id).unwrap().status,
        FinancingStatus::Liquidated
    );
    assert_eq!(
        ctx.engine.store().get_investment(inv.id).unwrap().status,
        InvestmentStatus::LiquidatedByPenalty
    );
    assert_eq!(
        ctx.engine.store().get_account(user).unwrap().unwrap().balance,
        money(dec!(79400))
    );

    let kinds: Vec<TransactionKind> = ctx
        .engine
        .store()
        .list_transactions_for_user(user)
        .unwrap()
        .iter()
        .map(|t| t.kind)
        .collect();
    assert!(kinds.contains(&TransactionKind::PenaltyCharged));
    assert!(kinds.contains(&TransactionKind::LiquidationSurplus));
}

/// Liquidation rejection: collateral 15000 against debt 20000 fails
/// with InsufficientCollateral and modifies nothing.
#[tokio::test]
async fn test_liquidation_rejected_on_insufficient_collateral() {
    let (mut ctx, _dir) = app_with_financing_pct(dec!(25));

    let user = Uuid::new_v4();
    let inv = ctx
        .engine
        .fund_investment(user, money(dec!(100000)), &action("funding"))
        .await
        .unwrap();
    let (fin, _) = ctx
        .engine
        .create_financing(inv.id, money(dec!(20000)), 4, Utc::now(), &action("draw"))
        .unwrap();

    // Collateral value collapses below the outstanding debt
    let mut collapsed = ctx.engine.store().get_investment(inv.id).unwrap();
    collapsed.current_value = money(dec!(15000));
    ctx.engine
        .store_mut()
        .transaction::<_, StoreError>(|tx| tx.update_investment(&collapsed))
        .unwrap();

    let result = ctx.engine.force_liquidate(fin.id, &action("attempt")).await;
    match result {
        Err(FinancingError::InsufficientCollateral { collateral, required, .. }) => {
            assert_eq!(collateral, money(dec!(15000)));
            assert_eq!(required, money(dec!(20600)));
        }
        other => panic!("expected InsufficientCollateral, got {other:?}"),
    }

    let fin = ctx.engine.store().get_financing(fin.id).unwrap();
    assert_eq!(fin.status, FinancingStatus::Active);
    assert_eq!(fin.remaining, money(dec!(20000)));
    for ins in ctx.engine.store().list_installments(fin.id).unwrap() {
        assert_eq!(ins.status, InstallmentStatus::Pending);
    }
    assert!(ctx.engine.store().get_account(user).unwrap().is_none());
}

/// Value adjustment rejection: limit 10000, used 9000; adjusting to a
/// value whose limit is 8000 fails with CreditViolation, unchanged.
#[tokio::test]
async fn test_value_adjustment_rejected() {
    let (mut ctx, _dir) = app();
    let user = Uuid::new_v4();

    let inv = ctx
        .engine
        .fund_investment(user, money(dec!(66666.67)), &action("funding"))
        .await
        .unwrap();
    assert_eq!(inv.credit_limit, money(dec!(10000)));

    ctx.engine
        .create_financing(inv.id, money(dec!(9000)), 6, Utc::now(), &action("draw"))
        .unwrap();

    let result = ctx
        .engine
        .adjust_investment_value(inv.id, money(dec!(53333.33)), &action("market drop"))
        .await;
    match result {
        Err(FinancingError::Credit(CreditError::CreditViolation { new_limit, credit_used })) => {
            assert_eq!(new_limit, money(dec!(8000)));
            assert_eq!(credit_used, money(dec!(9000)));
        }
        other => panic!("expected CreditViolation, got {other:?}"),
    }

    let stored = ctx.engine.store().get_investment(inv.id).unwrap();
    assert_eq!(stored.current_value, money(dec!(66666.67)));
    assert_eq!(stored.credit_limit, money(dec!(10000)));
    assert_eq!(stored.credit_used, money(dec!(9000)));
}

/// Completion: 3 installments of 1000 paid in sequence; COMPLETED
/// exactly after the third, credit released exactly once.
#[tokio::test]
async fn test_completion_releases_credit_once() {
    let (mut ctx, _dir) = app();
    let (inv_id, fin_id, installments) = fund_and_draw(&mut ctx, dec!(100000), dec!(3000), 3).await;

    for (i, ins_id) in installments.iter().enumerate() {
        let (_, fin) = ctx.engine.pay_installment(*ins_id, &action("payment")).unwrap();
        let used = ctx.engine.store().get_investment(inv_id).unwrap().credit_used;
        if i < 2 {
            assert_eq!(fin.status, FinancingStatus::Active);
            assert_eq!(used, money(dec!(3000)), "credit held until completion");
        } else {
            assert_eq!(fin.status, FinancingStatus::Completed);
            assert_eq!(used, Money::ZERO, "credit released on completion");
        }
    }

    let fin = ctx.engine.store().get_financing(fin_id).unwrap();
    assert!(fin.completed_at.is_some());
}

/// Concurrency: a stale writer loses with a Conflict the caller can
/// retry; the first write is what persisted.
#[tokio::test]
async fn test_concurrent_modification_surfaces_conflict() {
    let (mut ctx, _dir) = app();
    let (inv_id, _, _) = fund_and_draw(&mut ctx, dec!(100000), dec!(3000), 3).await;

    let snapshot_a = ctx.engine.store().get_investment(inv_id).unwrap();
    let snapshot_b = snapshot_a.clone();

    let mut first = snapshot_a;
    first.current_value = money(dec!(110000));
    ctx.engine
        .store_mut()
        .transaction::<_, StoreError>(|tx| tx.update_investment(&first))
        .unwrap();

    let mut second = snapshot_b;
    second.current_value = money(dec!(90000));
    let result = ctx
        .engine
        .store_mut()
        .transaction::<_, StoreError>(|tx| tx.update_investment(&second));
    match result {
        Err(e @ StoreError::Conflict { .. }) => assert!(e.is_retryable()),
        other => panic!("expected Conflict, got {other:?}"),
    }

    assert_eq!(
        ctx.engine.store().get_investment(inv_id).unwrap().current_value,
        money(dec!(110000))
    );
}

/// The audit trail records operator identity, reason and before/after
/// snapshots for every successful mutation, and survives reopening.
#[tokio::test]
async fn test_audit_trail_written() {
    let dir = TempDir::new().unwrap();
    {
        let mut ctx = AppContext::new(dir.path()).unwrap();
        let user = Uuid::new_v4();
        let inv = ctx
            .engine
            .fund_investment(user, money(dec!(50000)), &action("collateral in"))
            .await
            .unwrap();
        ctx.engine
            .create_financing(inv.id, money(dec!(5000)), 5, Utc::now(), &action("customer request"))
            .unwrap();
    }

    let audit = lombard_audit::JsonlAuditLog::open(dir.path().join("audit.jsonl")).unwrap();
    let records = audit.read_all().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].action, lombard_audit::AuditAction::InvestmentFunded);
    assert_eq!(records[1].action, lombard_audit::AuditAction::FinancingCreated);
    assert_eq!(records[1].operator_id, "op-1");
    assert_eq!(records[1].reason, "customer request");
    assert!(records[1].after["financing"]["id"].is_string());
}

/// Overdue + penalty flow: waive recomputes total_due and remaining;
/// extension clears OVERDUE and re-derives the financing's next due.
#[tokio::test]
async fn test_overdue_waive_and_extend() {
    let (mut ctx, _dir) = app();
    let (_, fin_id, installments) = fund_and_draw(&mut ctx, dec!(100000), dec!(3000), 3).await;

    // The external rollover job marks the first installment OVERDUE
    // with an assessed penalty, bumping the financing's remaining
    let mut ins = ctx.engine.store().get_installment(installments[0]).unwrap();
    ins.status = InstallmentStatus::Overdue;
    ins.penalty_amount = money(dec!(120));
    ins.total_due = ins.amount.try_add(ins.penalty_amount).unwrap();
    let mut fin = ctx.engine.store().get_financing(fin_id).unwrap();
    fin.remaining = fin.remaining.try_add(money(dec!(120))).unwrap();
    ctx.engine
        .store_mut()
        .transaction::<_, StoreError>(|tx| {
            tx.update_installment(&ins)?;
            tx.update_financing(&fin)
        })
        .unwrap();

    // Waiving with no penalty elsewhere fails
    let result = ctx.engine.waive_penalty(installments[1], &action("goodwill"));
    assert!(matches!(
        result,
        Err(FinancingError::Installment(InstallmentError::NoPenaltyToWaive { .. }))
    ));

    // Waive the real penalty
    let waived = ctx.engine.waive_penalty(installments[0], &action("goodwill")).unwrap();
    assert_eq!(waived.penalty_amount, Money::ZERO);
    assert_eq!(waived.total_due, waived.amount);
    assert_eq!(
        ctx.engine.store().get_financing(fin_id).unwrap().remaining,
        money(dec!(3000))
    );

    // Extend it: OVERDUE clears back to PENDING
    let new_date = Utc::now() + chrono::Duration::days(14);
    let extended = ctx
        .engine
        .extend_due_date(installments[0], new_date, &action("hardship"))
        .unwrap();
    assert_eq!(extended.status, InstallmentStatus::Pending);
    assert_eq!(extended.due_date, new_date);

    // Invariants still hold end to end
    let fin = ctx.engine.store().get_financing(fin_id).unwrap();
    let all = ctx.engine.store().list_installments(fin_id).unwrap();
    check_remaining_invariant(&fin, &all).unwrap();
}

/// Investment liquidation with outstanding draws is rejected with the
/// active financing count.
#[tokio::test]
async fn test_investment_liquidation_blocked_by_active_financings() {
    let (mut ctx, _dir) = app();
    let (inv_id, _, _) = fund_and_draw(&mut ctx, dec!(100000), dec!(3000), 3).await;

    let result = ctx
        .engine
        .force_liquidate_investment(inv_id, &action("customer exit"));
    match result {
        Err(FinancingError::ActiveFinancingsExist { count, investment_id }) => {
            assert_eq!(count, 1);
            assert_eq!(investment_id, inv_id);
        }
        other => panic!("expected ActiveFinancingsExist, got {other:?}"),
    }

    let stored = ctx.engine.store().get_investment(inv_id).unwrap();
    assert_eq!(stored.status, InvestmentStatus::Active);
}

/// State survives process restart: a reopened context sees everything.
#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let (inv_id, fin_id) = {
        let mut ctx = AppContext::new(dir.path()).unwrap();
        let inv = ctx
            .engine
            .fund_investment(Uuid::new_v4(), money(dec!(100000)), &action("funding"))
            .await
            .unwrap();
        let (fin, schedule) = ctx
            .engine
            .create_financing(inv.id, money(dec!(3000)), 3, Utc::now(), &action("draw"))
            .unwrap();
        ctx.engine.pay_installment(schedule[0].id, &action("payment")).unwrap();
        (inv.id, fin.id)
    };

    let ctx = AppContext::new(dir.path()).unwrap();
    let fin = ctx.engine.store().get_financing(fin_id).unwrap();
    assert_eq!(fin.remaining, money(dec!(2000)));
    let inv = ctx.engine.store().get_investment(inv_id).unwrap();
    assert_eq!(inv.credit_used, money(dec!(3000)));
}
