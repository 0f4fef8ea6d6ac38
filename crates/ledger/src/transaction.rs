//! TransactionRecord - append-only money-movement log

use chrono::{DateTime, Utc};
use lombard_core::Money;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Kind of money-moving event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    InvestmentFunded,
    FinancingDrawn,
    InstallmentPaid,
    PenaltyWaived,
    PenaltyCharged,
    LiquidationSurplus,
    InvestmentLiquidated,
    ValueAdjusted,
}

/// One row per money-moving event, append-only.
///
/// `metadata` carries free-form JSON referencing the originating
/// Financing/Installment/Investment ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub user_id: Uuid,
    pub amount: Money,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn new(kind: TransactionKind, user_id: Uuid, amount: Money, metadata: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            user_id,
            amount,
            metadata,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_kind_parse_roundtrip() {
        let k: TransactionKind = "PENALTY_CHARGED".parse().unwrap();
        assert_eq!(k, TransactionKind::PenaltyCharged);
        assert_eq!(k.to_string(), "PENALTY_CHARGED");
    }

    #[test]
    fn test_record_serde() {
        let rec = TransactionRecord::new(
            TransactionKind::LiquidationSurplus,
            Uuid::new_v4(),
            Money::new(dec!(79400)).unwrap(),
            json!({"financing_id": "f-1"}),
        );
        let s = serde_json::to_string(&rec).unwrap();
        let back: TransactionRecord = serde_json::from_str(&s).unwrap();
        assert_eq!(rec, back);
    }
}
