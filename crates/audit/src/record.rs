//! Audit record - one entry per successful mutation

use chrono::{DateTime, Utc};
use lombard_core::ActionContext;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// The mutating operation being audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    InvestmentFunded,
    ValueAdjusted,
    FinancingCreated,
    InstallmentPaid,
    PenaltyWaived,
    DueDateExtended,
    FinancingLiquidated,
    InvestmentLiquidated,
}

/// Immutable description of one mutation: who, why, and the entity
/// snapshots before and after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub action: AuditAction,
    pub operator_id: String,
    pub operator_name: String,
    pub reason: String,
    /// Entity snapshot(s) before the mutation, as JSON
    pub before: serde_json::Value,
    /// Entity snapshot(s) after the mutation, as JSON
    pub after: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        action: AuditAction,
        ctx: &ActionContext,
        before: serde_json::Value,
        after: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            operator_id: ctx.operator_id.clone(),
            operator_name: ctx.operator_name.clone(),
            reason: ctx.reason.clone(),
            before,
            after,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_parse_roundtrip() {
        let a: AuditAction = "FINANCING_LIQUIDATED".parse().unwrap();
        assert_eq!(a, AuditAction::FinancingLiquidated);
        assert_eq!(a.to_string(), "FINANCING_LIQUIDATED");
    }

    #[test]
    fn test_record_carries_context() {
        let ctx = ActionContext::new("op-7", "Jane Doe", "arrears beyond policy");
        let rec = AuditRecord::new(
            AuditAction::FinancingLiquidated,
            &ctx,
            json!({"remaining": "20000"}),
            json!({"remaining": "0"}),
        );
        assert_eq!(rec.operator_id, "op-7");
        assert_eq!(rec.reason, "arrears beyond policy");
        assert_eq!(rec.before["remaining"], "20000");
    }
}
