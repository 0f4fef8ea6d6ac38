//! Financing lifecycle orchestration
//!
//! Each operation follows the same shape: read current state, apply the
//! credit/installment engine rules, perform one atomic multi-row update,
//! re-check invariants, then emit an audit record. A failure anywhere
//! rolls the whole unit back; the caller retries on a version conflict.

use crate::error::FinancingError;
use crate::summary::LiquidationSummary;
use chrono::{DateTime, Utc};
use lombard_audit::{AuditAction, AuditError, AuditRecord, AuditSink};
use lombard_core::{ActionContext, Money};
use lombard_ledger::{
    check_credit_invariant, check_remaining_invariant, AccountBalance, Financing, FinancingStatus,
    Installment, InstallmentStatus, Investment, InvestmentStatus, LedgerStore, TransactionKind,
    TransactionRecord,
};
use lombard_rates::{RateProvider, FINANCING_PERCENTAGE, PENALTY_RATE};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Days between scheduled installments.
const INSTALLMENT_INTERVAL_DAYS: i64 = 30;

/// The Financing Lifecycle Engine.
///
/// Owns the ledger store handle and the external collaborators (rate
/// provider, audit sink). Constructed explicitly and passed around; no
/// process-wide singleton.
pub struct FinancingEngine {
    store: LedgerStore,
    rates: Arc<dyn RateProvider>,
    audit: Arc<dyn AuditSink>,
}

fn snapshot<T: Serialize>(value: &T) -> Result<serde_json::Value, FinancingError> {
    serde_json::to_value(value).map_err(|e| FinancingError::Audit(AuditError::Serialization(e)))
}

impl FinancingEngine {
    pub fn new(store: LedgerStore, rates: Arc<dyn RateProvider>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, rates, audit }
    }

    /// Read-only view of the ledger store.
    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Direct store access for maintenance jobs that live outside this
    /// core (e.g. the scheduled OVERDUE rollover) and for tests.
    pub fn store_mut(&mut self) -> &mut LedgerStore {
        &mut self.store
    }

    /// Fund collateral: create an ACTIVE investment whose credit limit
    /// derives from the configured financing percentage.
    pub async fn fund_investment(
        &mut self,
        user_id: Uuid,
        principal: Money,
        ctx: &ActionContext,
    ) -> Result<Investment, FinancingError> {
        let pct = self.rates.get_rate(FINANCING_PERCENTAGE).await?;
        let credit_limit = lombard_credit::credit_limit_for(principal, pct)?;
        let investment = Investment::new(user_id, principal, credit_limit);

        let inserted = investment.clone();
        self.store.transaction::<_, FinancingError>(|tx| {
            tx.insert_investment(&inserted)?;
            tx.insert_transaction(&TransactionRecord::new(
                TransactionKind::InvestmentFunded,
                inserted.user_id,
                inserted.principal,
                json!({ "investment_id": inserted.id }),
            ))?;
            Ok::<_, FinancingError>(())
        })?;

        self.emit(
            AuditAction::InvestmentFunded,
            ctx,
            serde_json::Value::Null,
            snapshot(&investment)?,
        )?;
        info!(investment = %investment.id, user = %user_id, %principal, "investment funded");
        Ok(investment)
    }

    /// Draw a financing against an investment's credit limit and lay
    /// out its installment schedule.
    pub fn create_financing(
        &mut self,
        investment_id: Uuid,
        amount: Money,
        installment_count: u32,
        first_due: DateTime<Utc>,
        ctx: &ActionContext,
    ) -> Result<(Financing, Vec<Installment>), FinancingError> {
        let (inv_before, investment, financing, schedule) = self.store.transaction::<_, FinancingError>(|tx| {
            let mut inv = tx.get_investment(investment_id)?;
            if !inv.is_active() {
                return Err(FinancingError::InvestmentNotActive(investment_id));
            }
            let inv_before = inv.clone();

            lombard_credit::reserve(&mut inv, amount)?;
            check_credit_invariant(&inv)?;

            let mut fin = Financing::new(inv.user_id, investment_id, amount, installment_count, Money::ZERO);
            let schedule = lombard_installment::build_schedule(
                fin.id,
                amount,
                installment_count,
                first_due,
                INSTALLMENT_INTERVAL_DAYS,
            )?;
            fin.installment_amount = schedule[0].amount;
            fin.next_due_date = Some(schedule[0].due_date);
            check_remaining_invariant(&fin, &schedule)?;

            tx.update_investment(&inv)?;
            tx.insert_financing(&fin)?;
            for ins in &schedule {
                tx.insert_installment(ins)?;
            }
            tx.insert_transaction(&TransactionRecord::new(
                TransactionKind::FinancingDrawn,
                fin.user_id,
                amount,
                json!({ "financing_id": fin.id, "investment_id": investment_id }),
            ))?;
            Ok((inv_before, inv, fin, schedule))
        })?;

        self.emit(
            AuditAction::FinancingCreated,
            ctx,
            json!({ "investment": snapshot(&inv_before)? }),
            json!({
                "investment": snapshot(&investment)?,
                "financing": snapshot(&financing)?,
            }),
        )?;
        info!(
            financing = %financing.id,
            investment = %investment_id,
            %amount,
            installments = installment_count,
            "financing created"
        );
        Ok((financing, schedule))
    }

    /// Manually settle one installment. Reduces the financing's
    /// remaining balance and, when the last installment is settled,
    /// completes the financing and releases its credit reservation.
    pub fn pay_installment(
        &mut self,
        installment_id: Uuid,
        ctx: &ActionContext,
    ) -> Result<(Installment, Financing), FinancingError> {
        let now = Utc::now();
        let (ins_before, fin_before, paid, financing, released) = self.store.transaction::<_, FinancingError>(|tx| {
            let mut ins = tx.get_installment(installment_id)?;
            let ins_before = ins.clone();
            lombard_installment::pay(&mut ins, now)?;
            tx.update_installment(&ins)?;

            let mut fin = tx.get_financing(ins.financing_id)?;
            if !fin.is_active() {
                return Err(FinancingError::FinancingNotActive(fin.id));
            }
            let fin_before = fin.clone();

            // Clamped at zero: the final installment can carry a
            // rounding remainder
            fin.remaining = fin.remaining.saturating_sub(ins.total_due);

            let all = tx.list_installments(fin.id)?;
            let next = all
                .iter()
                .filter(|i| i.is_outstanding())
                .min_by_key(|i| i.due_date);

            let mut released = None;
            match next {
                Some(n) => fin.next_due_date = Some(n.due_date),
                None => {
                    fin.status = FinancingStatus::Completed;
                    fin.completed_at = Some(now);
                    fin.next_due_date = None;

                    let mut inv = tx.get_investment(fin.investment_id)?;
                    lombard_credit::release(&mut inv, fin.amount);
                    check_credit_invariant(&inv)?;
                    tx.update_investment(&inv)?;
                    released = Some(inv);
                }
            }

            check_remaining_invariant(&fin, &all)?;
            tx.update_financing(&fin)?;
            tx.insert_transaction(&TransactionRecord::new(
                TransactionKind::InstallmentPaid,
                fin.user_id,
                ins.total_due,
                json!({
                    "installment_id": ins.id,
                    "financing_id": fin.id,
                    "number": ins.number,
                }),
            ))?;
            Ok((ins_before, fin_before, ins, fin, released))
        })?;

        let mut after = json!({
            "installment": snapshot(&paid)?,
            "financing": snapshot(&financing)?,
        });
        if let Some(inv) = &released {
            after["investment"] = snapshot(inv)?;
        }
        self.emit(
            AuditAction::InstallmentPaid,
            ctx,
            json!({
                "installment": snapshot(&ins_before)?,
                "financing": snapshot(&fin_before)?,
            }),
            after,
        )?;
        info!(
            installment = %paid.id,
            financing = %financing.id,
            remaining = %financing.remaining,
            completed = !financing.is_active(),
            "installment paid"
        );
        Ok((paid, financing))
    }

    /// Waive an installment's assessed penalty. The parent financing's
    /// remaining balance drops by the waived amount so the
    /// outstanding-total invariant stays exact.
    pub fn waive_penalty(
        &mut self,
        installment_id: Uuid,
        ctx: &ActionContext,
    ) -> Result<Installment, FinancingError> {
        let (ins_before, waived, installment, financing) = self.store.transaction::<_, FinancingError>(|tx| {
            let mut ins = tx.get_installment(installment_id)?;
            let ins_before = ins.clone();
            let waived = lombard_installment::waive_penalty(&mut ins)?;
            tx.update_installment(&ins)?;

            let mut fin = tx.get_financing(ins.financing_id)?;
            if fin.is_active() && ins.is_outstanding() {
                fin.remaining = fin.remaining.saturating_sub(waived);
                let all = tx.list_installments(fin.id)?;
                check_remaining_invariant(&fin, &all)?;
                tx.update_financing(&fin)?;
            }
            tx.insert_transaction(&TransactionRecord::new(
                TransactionKind::PenaltyWaived,
                fin.user_id,
                waived,
                json!({ "installment_id": ins.id, "financing_id": fin.id }),
            ))?;
            Ok((ins_before, waived, ins, fin))
        })?;

        self.emit(
            AuditAction::PenaltyWaived,
            ctx,
            json!({ "installment": snapshot(&ins_before)? }),
            json!({ "installment": snapshot(&installment)?, "waived": waived }),
        )?;
        info!(installment = %installment.id, financing = %financing.id, %waived, "penalty waived");
        Ok(installment)
    }

    /// Move an installment's due date, clearing OVERDUE back to
    /// PENDING, and re-derive the parent financing's next due date.
    pub fn extend_due_date(
        &mut self,
        installment_id: Uuid,
        new_date: DateTime<Utc>,
        ctx: &ActionContext,
    ) -> Result<Installment, FinancingError> {
        let (ins_before, installment, financing) = self.store.transaction::<_, FinancingError>(|tx| {
            let mut ins = tx.get_installment(installment_id)?;
            let ins_before = ins.clone();
            lombard_installment::extend_due_date(&mut ins, new_date)?;
            tx.update_installment(&ins)?;

            let mut fin = tx.get_financing(ins.financing_id)?;
            if fin.is_active() {
                let all = tx.list_installments(fin.id)?;
                let next_due = all
                    .iter()
                    .filter(|i| i.is_outstanding())
                    .map(|i| i.due_date)
                    .min();
                if fin.next_due_date != next_due {
                    fin.next_due_date = next_due;
                    tx.update_financing(&fin)?;
                }
            }
            Ok::<_, FinancingError>((ins_before, ins, fin))
        })?;

        self.emit(
            AuditAction::DueDateExtended,
            ctx,
            json!({ "installment": snapshot(&ins_before)? }),
            json!({ "installment": snapshot(&installment)? }),
        )?;
        info!(
            installment = %installment.id,
            financing = %financing.id,
            due = %new_date,
            "due date extended"
        );
        Ok(installment)
    }

    /// Forcibly liquidate an ACTIVE financing: charge the penalty,
    /// drop open installments, close the financing, liquidate the
    /// backing investment, and return any collateral surplus to the
    /// user's account.
    pub async fn force_liquidate(
        &mut self,
        financing_id: Uuid,
        ctx: &ActionContext,
    ) -> Result<(LiquidationSummary, Financing, Investment), FinancingError> {
        let penalty_rate = self.rates.get_rate(PENALTY_RATE).await?;
        let now = Utc::now();

        let (summary, fin_before, inv_before, financing, investment) =
            self.store.transaction::<_, FinancingError>(|tx| {
                let mut fin = tx.get_financing(financing_id)?;
                if !fin.is_active() {
                    return Err(FinancingError::FinancingNotActive(financing_id));
                }
                // A fully paid financing that missed its completion
                // update must not be silently "liquidated"
                if fin.remaining.is_zero() {
                    return Err(FinancingError::NothingToLiquidate(financing_id));
                }
                let mut inv = tx.get_investment(fin.investment_id)?;
                let fin_before = fin.clone();
                let inv_before = inv.clone();

                let penalty = fin.remaining.percent_of(penalty_rate)?;
                let total_due = fin.remaining.try_add(penalty)?;
                if inv.current_value < total_due {
                    return Err(FinancingError::InsufficientCollateral {
                        collateral: inv.current_value,
                        required: total_due,
                        shortfall: total_due.saturating_sub(inv.current_value),
                    });
                }

                for mut ins in tx.list_installments(fin.id)? {
                    if ins.is_outstanding() {
                        ins.status = InstallmentStatus::Dropped;
                        tx.update_installment(&ins)?;
                    }
                }

                let debt_paid = fin.remaining;
                fin.status = FinancingStatus::Liquidated;
                fin.penalty_amount = penalty;
                fin.remaining = Money::ZERO;
                fin.completed_at = Some(now);
                fin.next_due_date = None;
                tx.update_financing(&fin)?;

                let value_before = inv.current_value;
                inv.status = InvestmentStatus::LiquidatedByPenalty;
                inv.current_value = Money::ZERO;
                inv.credit_used = Money::ZERO;
                inv.liquidated_at = Some(now);
                tx.update_investment(&inv)?;

                let surplus = value_before.saturating_sub(total_due);
                if !surplus.is_zero() {
                    tx.credit_account(fin.user_id, surplus)?;
                    tx.insert_transaction(&TransactionRecord::new(
                        TransactionKind::LiquidationSurplus,
                        fin.user_id,
                        surplus,
                        json!({ "financing_id": fin.id, "investment_id": inv.id }),
                    ))?;
                }
                tx.insert_transaction(&TransactionRecord::new(
                    TransactionKind::PenaltyCharged,
                    fin.user_id,
                    penalty,
                    json!({
                        "financing_id": fin.id,
                        "penalty_rate": penalty_rate.to_string(),
                        "debt_paid": debt_paid,
                    }),
                ))?;

                let summary = LiquidationSummary {
                    debt_paid,
                    penalty_charged: penalty,
                    total_deducted: total_due,
                    returned_to_user: surplus,
                };
                Ok((summary, fin_before, inv_before, fin, inv))
            })?;

        self.emit(
            AuditAction::FinancingLiquidated,
            ctx,
            json!({
                "financing": snapshot(&fin_before)?,
                "investment": snapshot(&inv_before)?,
            }),
            json!({
                "financing": snapshot(&financing)?,
                "investment": snapshot(&investment)?,
                "summary": snapshot(&summary)?,
            }),
        )?;
        info!(
            financing = %financing_id,
            debt = %summary.debt_paid,
            penalty = %summary.penalty_charged,
            returned = %summary.returned_to_user,
            "financing liquidated"
        );
        Ok((summary, financing, investment))
    }

    /// Voluntarily liquidate an investment with no active financings:
    /// the collateral value is paid out to the user's account.
    pub fn force_liquidate_investment(
        &mut self,
        investment_id: Uuid,
        ctx: &ActionContext,
    ) -> Result<(Investment, AccountBalance), FinancingError> {
        let now = Utc::now();
        let (inv_before, investment, account) = self.store.transaction::<_, FinancingError>(|tx| {
            let mut inv = tx.get_investment(investment_id)?;
            if !inv.is_active() {
                return Err(FinancingError::InvestmentNotActive(investment_id));
            }
            let count = tx.count_active_financings(investment_id)?;
            if count > 0 {
                return Err(FinancingError::ActiveFinancingsExist {
                    investment_id,
                    count,
                });
            }
            let inv_before = inv.clone();

            let payout = inv.current_value;
            inv.status = InvestmentStatus::Liquidated;
            inv.current_value = Money::ZERO;
            inv.liquidated_at = Some(now);
            check_credit_invariant(&inv)?;
            tx.update_investment(&inv)?;

            let account = tx.credit_account(inv.user_id, payout)?;
            tx.insert_transaction(&TransactionRecord::new(
                TransactionKind::InvestmentLiquidated,
                inv.user_id,
                payout,
                json!({ "investment_id": inv.id }),
            ))?;
            Ok((inv_before, inv, account))
        })?;

        self.emit(
            AuditAction::InvestmentLiquidated,
            ctx,
            snapshot(&inv_before)?,
            snapshot(&investment)?,
        )?;
        info!(investment = %investment_id, payout = %inv_before.current_value, "investment liquidated");
        Ok((investment, account))
    }

    /// Adjust an investment's collateral value, recomputing the credit
    /// limit from the configured financing percentage.
    pub async fn adjust_investment_value(
        &mut self,
        investment_id: Uuid,
        new_value: Money,
        ctx: &ActionContext,
    ) -> Result<Investment, FinancingError> {
        let pct = self.rates.get_rate(FINANCING_PERCENTAGE).await?;
        let (inv_before, investment) = self.store.transaction::<_, FinancingError>(|tx| {
            let mut inv = tx.get_investment(investment_id)?;
            if !inv.is_active() {
                return Err(FinancingError::InvestmentNotActive(investment_id));
            }
            let inv_before = inv.clone();
            lombard_credit::adjust_value(&mut inv, new_value, pct)?;
            check_credit_invariant(&inv)?;
            tx.update_investment(&inv)?;
            tx.insert_transaction(&TransactionRecord::new(
                TransactionKind::ValueAdjusted,
                inv.user_id,
                new_value,
                json!({
                    "investment_id": inv.id,
                    "previous_value": inv_before.current_value,
                }),
            ))?;
            Ok((inv_before, inv))
        })?;

        self.emit(
            AuditAction::ValueAdjusted,
            ctx,
            snapshot(&inv_before)?,
            snapshot(&investment)?,
        )?;
        info!(
            investment = %investment_id,
            value = %new_value,
            limit = %investment.credit_limit,
            "investment value adjusted"
        );
        Ok(investment)
    }

    fn emit(
        &self,
        action: AuditAction,
        ctx: &ActionContext,
        before: serde_json::Value,
        after: serde_json::Value,
    ) -> Result<(), FinancingError> {
        let record = AuditRecord::new(action, ctx, before, after);
        self.audit.record(&record)?;
        Ok(())
    }
}
