//! Application context - wires everything together

use lombard_audit::JsonlAuditLog;
use lombard_financing::FinancingEngine;
use lombard_ledger::LedgerStore;
use lombard_rates::{StaticRates, FINANCING_PERCENTAGE, PENALTY_RATE};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Application context - store, rates, audit trail and engine rooted
/// at a data directory.
pub struct AppContext {
    pub engine: FinancingEngine,
    data_path: PathBuf,
}

impl AppContext {
    /// Create a context rooted at `data_path`.
    ///
    /// Layout: `ledger.db` (SQLite ledger) and `audit.jsonl` (audit
    /// trail). Rates come from the platform defaults, overridable via
    /// `LOMBARD_PENALTY_RATE` / `LOMBARD_FINANCING_PERCENTAGE` for
    /// local runs.
    pub fn new(data_path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let rates = StaticRates::with_defaults();
        if let Some(rate) = env_rate("LOMBARD_PENALTY_RATE") {
            rates.set_rate(PENALTY_RATE, rate);
        }
        if let Some(pct) = env_rate("LOMBARD_FINANCING_PERCENTAGE") {
            rates.set_rate(FINANCING_PERCENTAGE, pct);
        }
        Self::with_rates(data_path, rates)
    }

    /// Create a context with an explicit rate configuration (tests,
    /// or callers that already hold the platform configuration).
    pub fn with_rates(
        data_path: impl AsRef<Path>,
        rates: StaticRates,
    ) -> Result<Self, anyhow::Error> {
        let data_path = data_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_path)?;

        let store = LedgerStore::open(data_path.join("ledger.db"))?;
        let audit = JsonlAuditLog::open(data_path.join("audit.jsonl"))?;

        let engine = FinancingEngine::new(store, Arc::new(rates), Arc::new(audit));
        Ok(Self { engine, data_path })
    }

    /// Root data directory
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }
}

fn env_rate(var: &str) -> Option<Decimal> {
    std::env::var(var)
        .ok()
        .and_then(|v| Decimal::from_str(&v).ok())
}
