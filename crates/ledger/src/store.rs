//! SQLite-backed ledger store
//!
//! The store is an explicitly constructed handle passed into the engine;
//! there is no process-wide singleton. Every mutating engine operation
//! runs inside [`LedgerStore::transaction`], which commits on `Ok` and
//! rolls back completely on `Err`. Mutable rows carry a `version`
//! column; updates execute `WHERE id = ? AND version = ?` and surface a
//! stale token as [`StoreError::Conflict`].

use crate::account::AccountBalance;
use crate::error::StoreError;
use crate::financing::{Financing, FinancingStatus};
use crate::installment::{Installment, InstallmentStatus};
use crate::investment::{Investment, InvestmentStatus};
use crate::transaction::{TransactionKind, TransactionRecord};
use chrono::{DateTime, Utc};
use lombard_core::Money;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// SQLite-backed relational state for the financing engine
pub struct LedgerStore {
    conn: Connection,
}

impl LedgerStore {
    /// Open (or create) a store at the given database path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS investments (
                id            TEXT PRIMARY KEY,
                user_id       TEXT NOT NULL,
                principal     TEXT NOT NULL,
                current_value TEXT NOT NULL,
                credit_limit  TEXT NOT NULL,
                credit_used   TEXT NOT NULL,
                status        TEXT NOT NULL,
                created_at    TEXT NOT NULL,
                liquidated_at TEXT,
                version       INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS financings (
                id                 TEXT PRIMARY KEY,
                user_id            TEXT NOT NULL,
                investment_id      TEXT NOT NULL REFERENCES investments(id),
                amount             TEXT NOT NULL,
                installment_count  INTEGER NOT NULL,
                installment_amount TEXT NOT NULL,
                remaining          TEXT NOT NULL,
                penalty_amount     TEXT NOT NULL,
                next_due_date      TEXT,
                status             TEXT NOT NULL,
                created_at         TEXT NOT NULL,
                completed_at       TEXT,
                version            INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS installments (
                id             TEXT PRIMARY KEY,
                financing_id   TEXT NOT NULL REFERENCES financings(id),
                number         INTEGER NOT NULL,
                amount         TEXT NOT NULL,
                penalty_amount TEXT NOT NULL,
                total_due      TEXT NOT NULL,
                due_date       TEXT NOT NULL,
                status         TEXT NOT NULL,
                paid_at        TEXT,
                version        INTEGER NOT NULL,
                UNIQUE(financing_id, number)
            );
            CREATE TABLE IF NOT EXISTS accounts (
                user_id TEXT PRIMARY KEY,
                balance TEXT NOT NULL,
                version INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS transactions (
                id         TEXT PRIMARY KEY,
                kind       TEXT NOT NULL,
                user_id    TEXT NOT NULL,
                amount     TEXT NOT NULL,
                metadata   TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_financings_investment
                ON financings(investment_id, status);
            CREATE INDEX IF NOT EXISTS idx_installments_financing
                ON installments(financing_id, number);
            CREATE INDEX IF NOT EXISTS idx_transactions_user
                ON transactions(user_id, created_at);",
        )?;
        Ok(())
    }

    /// Run `f` inside a single atomic unit: commit on `Ok`, roll back
    /// completely on `Err`. The error type is generic so engine errors
    /// pass through unchanged.
    pub fn transaction<T, E>(
        &mut self,
        f: impl FnOnce(&LedgerTx<'_>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| E::from(StoreError::from(e)))?;
        let result = f(&LedgerTx { conn: &tx });
        match result {
            Ok(value) => {
                tx.commit().map_err(|e| E::from(StoreError::from(e)))?;
                Ok(value)
            }
            Err(err) => {
                // Rollback failure is unreachable state; the original
                // error is the one the caller needs.
                let _ = tx.rollback();
                Err(err)
            }
        }
    }

    // Read-only accessors (outside any transaction; eventual
    // consistency is acceptable for listings per the concurrency model)

    pub fn get_investment(&self, id: Uuid) -> Result<Investment, StoreError> {
        row::get_investment(&self.conn, id)
    }

    pub fn get_financing(&self, id: Uuid) -> Result<Financing, StoreError> {
        row::get_financing(&self.conn, id)
    }

    pub fn get_installment(&self, id: Uuid) -> Result<Installment, StoreError> {
        row::get_installment(&self.conn, id)
    }

    pub fn list_installments(&self, financing_id: Uuid) -> Result<Vec<Installment>, StoreError> {
        row::list_installments(&self.conn, financing_id)
    }

    pub fn list_financings_for_investment(
        &self,
        investment_id: Uuid,
    ) -> Result<Vec<Financing>, StoreError> {
        row::list_financings_for_investment(&self.conn, investment_id)
    }

    pub fn get_account(&self, user_id: Uuid) -> Result<Option<AccountBalance>, StoreError> {
        row::get_account(&self.conn, user_id)
    }

    pub fn list_transactions_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        row::list_transactions_for_user(&self.conn, user_id)
    }
}

/// Transactional unit of work handed to the closure of
/// [`LedgerStore::transaction`]. All writes go through here.
pub struct LedgerTx<'c> {
    conn: &'c Connection,
}

impl LedgerTx<'_> {
    pub fn get_investment(&self, id: Uuid) -> Result<Investment, StoreError> {
        row::get_investment(self.conn, id)
    }

    pub fn insert_investment(&self, inv: &Investment) -> Result<(), StoreError> {
        row::insert_investment(self.conn, inv)
    }

    pub fn update_investment(&self, inv: &Investment) -> Result<(), StoreError> {
        row::update_investment(self.conn, inv)
    }

    pub fn get_financing(&self, id: Uuid) -> Result<Financing, StoreError> {
        row::get_financing(self.conn, id)
    }

    pub fn insert_financing(&self, fin: &Financing) -> Result<(), StoreError> {
        row::insert_financing(self.conn, fin)
    }

    pub fn update_financing(&self, fin: &Financing) -> Result<(), StoreError> {
        row::update_financing(self.conn, fin)
    }

    pub fn list_financings_for_investment(
        &self,
        investment_id: Uuid,
    ) -> Result<Vec<Financing>, StoreError> {
        row::list_financings_for_investment(self.conn, investment_id)
    }

    pub fn count_active_financings(&self, investment_id: Uuid) -> Result<u32, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM financings WHERE investment_id = ?1 AND status = ?2",
            params![investment_id.to_string(), FinancingStatus::Active.to_string()],
            |r| r.get(0),
        )?;
        Ok(count as u32)
    }

    pub fn get_installment(&self, id: Uuid) -> Result<Installment, StoreError> {
        row::get_installment(self.conn, id)
    }

    pub fn insert_installment(&self, ins: &Installment) -> Result<(), StoreError> {
        row::insert_installment(self.conn, ins)
    }

    pub fn update_installment(&self, ins: &Installment) -> Result<(), StoreError> {
        row::update_installment(self.conn, ins)
    }

    pub fn list_installments(&self, financing_id: Uuid) -> Result<Vec<Installment>, StoreError> {
        row::list_installments(self.conn, financing_id)
    }

    pub fn get_account(&self, user_id: Uuid) -> Result<Option<AccountBalance>, StoreError> {
        row::get_account(self.conn, user_id)
    }

    /// Credit a user's balance, creating the account row on first use.
    pub fn credit_account(&self, user_id: Uuid, amount: Money) -> Result<AccountBalance, StoreError> {
        match row::get_account(self.conn, user_id)? {
            Some(mut account) => {
                account.balance = account.balance.checked_add(amount).ok_or_else(|| {
                    StoreError::Corrupt {
                        entity: "account",
                        id: user_id.to_string(),
                        detail: "balance overflow".to_string(),
                    }
                })?;
                row::update_account(self.conn, &account)?;
                account.version += 1;
                Ok(account)
            }
            None => {
                let account = AccountBalance {
                    user_id,
                    balance: amount,
                    version: 0,
                };
                self.conn.execute(
                    "INSERT INTO accounts (user_id, balance, version) VALUES (?1, ?2, ?3)",
                    params![
                        account.user_id.to_string(),
                        account.balance.value().to_string(),
                        account.version
                    ],
                )?;
                Ok(account)
            }
        }
    }

    pub fn insert_transaction(&self, rec: &TransactionRecord) -> Result<(), StoreError> {
        let metadata = serde_json::to_string(&rec.metadata)?;
        self.conn.execute(
            "INSERT INTO transactions (id, kind, user_id, amount, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                rec.id.to_string(),
                rec.kind.to_string(),
                rec.user_id.to_string(),
                rec.amount.value().to_string(),
                metadata,
                rec.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

/// Row mapping + versioned updates, shared between the store handle and
/// the transactional view.
mod row {
    use super::*;

    fn corrupt(entity: &'static str, id: &str, detail: impl Into<String>) -> StoreError {
        StoreError::Corrupt {
            entity,
            id: id.to_string(),
            detail: detail.into(),
        }
    }

    fn parse_money(s: &str, entity: &'static str, id: &str) -> Result<Money, StoreError> {
        let value = Decimal::from_str(s).map_err(|e| corrupt(entity, id, e.to_string()))?;
        Money::new(value).map_err(|e| corrupt(entity, id, e.to_string()))
    }

    fn parse_uuid(s: &str, entity: &'static str) -> Result<Uuid, StoreError> {
        Uuid::parse_str(s).map_err(|e| corrupt(entity, s, e.to_string()))
    }

    fn parse_ts(s: &str, entity: &'static str, id: &str) -> Result<DateTime<Utc>, StoreError> {
        DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| corrupt(entity, id, e.to_string()))
    }

    fn parse_opt_ts(
        s: Option<String>,
        entity: &'static str,
        id: &str,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        s.map(|s| parse_ts(&s, entity, id)).transpose()
    }

    fn parse_status<T: FromStr>(s: &str, entity: &'static str, id: &str) -> Result<T, StoreError> {
        s.parse()
            .map_err(|_| corrupt(entity, id, format!("unknown status {s}")))
    }

    /// Map zero affected rows on a versioned UPDATE to Conflict or NotFound.
    fn versioned_update_failed(
        conn: &Connection,
        table: &str,
        key_column: &str,
        entity: &'static str,
        id: &str,
    ) -> StoreError {
        let probe = format!("SELECT COUNT(*) FROM {table} WHERE {key_column} = ?1");
        let exists = conn
            .query_row(&probe, params![id], |r| r.get::<_, i64>(0))
            .map(|n| n > 0)
            .unwrap_or(false);
        if exists {
            StoreError::Conflict {
                entity,
                id: id.to_string(),
            }
        } else {
            StoreError::NotFound {
                entity,
                id: id.to_string(),
            }
        }
    }

    // === investments ===

    pub(super) fn insert_investment(conn: &Connection, inv: &Investment) -> Result<(), StoreError> {
        conn.execute(
            "INSERT INTO investments
             (id, user_id, principal, current_value, credit_limit, credit_used,
              status, created_at, liquidated_at, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                inv.id.to_string(),
                inv.user_id.to_string(),
                inv.principal.value().to_string(),
                inv.current_value.value().to_string(),
                inv.credit_limit.value().to_string(),
                inv.credit_used.value().to_string(),
                inv.status.to_string(),
                inv.created_at.to_rfc3339(),
                inv.liquidated_at.map(|t| t.to_rfc3339()),
                inv.version,
            ],
        )?;
        Ok(())
    }

    pub(super) fn get_investment(conn: &Connection, id: Uuid) -> Result<Investment, StoreError> {
        let key = id.to_string();
        let raw = conn
            .query_row(
                "SELECT id, user_id, principal, current_value, credit_limit, credit_used,
                        status, created_at, liquidated_at, version
                 FROM investments WHERE id = ?1",
                params![key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, Option<String>>(8)?,
                        row.get::<_, i64>(9)?,
                    ))
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound {
                    entity: "investment",
                    id: key.clone(),
                },
                other => StoreError::Database(other),
            })?;

        Ok(Investment {
            id: parse_uuid(&raw.0, "investment")?,
            user_id: parse_uuid(&raw.1, "investment")?,
            principal: parse_money(&raw.2, "investment", &key)?,
            current_value: parse_money(&raw.3, "investment", &key)?,
            credit_limit: parse_money(&raw.4, "investment", &key)?,
            credit_used: parse_money(&raw.5, "investment", &key)?,
            status: parse_status::<InvestmentStatus>(&raw.6, "investment", &key)?,
            created_at: parse_ts(&raw.7, "investment", &key)?,
            liquidated_at: parse_opt_ts(raw.8, "investment", &key)?,
            version: raw.9,
        })
    }

    pub(super) fn update_investment(conn: &Connection, inv: &Investment) -> Result<(), StoreError> {
        let key = inv.id.to_string();
        let rows = conn.execute(
            "UPDATE investments
             SET principal = ?2, current_value = ?3, credit_limit = ?4, credit_used = ?5,
                 status = ?6, liquidated_at = ?7, version = version + 1
             WHERE id = ?1 AND version = ?8",
            params![
                key,
                inv.principal.value().to_string(),
                inv.current_value.value().to_string(),
                inv.credit_limit.value().to_string(),
                inv.credit_used.value().to_string(),
                inv.status.to_string(),
                inv.liquidated_at.map(|t| t.to_rfc3339()),
                inv.version,
            ],
        )?;
        if rows == 0 {
            return Err(versioned_update_failed(
                conn,
                "investments",
                "id",
                "investment",
                &key,
            ));
        }
        Ok(())
    }

    // === financings ===

    pub(super) fn insert_financing(conn: &Connection, fin: &Financing) -> Result<(), StoreError> {
        conn.execute(
            "INSERT INTO financings
             (id, user_id, investment_id, amount, installment_count, installment_amount,
              remaining, penalty_amount, next_due_date, status, created_at, completed_at, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                fin.id.to_string(),
                fin.user_id.to_string(),
                fin.investment_id.to_string(),
                fin.amount.value().to_string(),
                fin.installment_count,
                fin.installment_amount.value().to_string(),
                fin.remaining.value().to_string(),
                fin.penalty_amount.value().to_string(),
                fin.next_due_date.map(|t| t.to_rfc3339()),
                fin.status.to_string(),
                fin.created_at.to_rfc3339(),
                fin.completed_at.map(|t| t.to_rfc3339()),
                fin.version,
            ],
        )?;
        Ok(())
    }

    type FinancingRow = (
        String,
        String,
        String,
        String,
        u32,
        String,
        String,
        String,
        Option<String>,
        String,
        String,
        Option<String>,
        i64,
    );

    fn financing_from_row(raw: FinancingRow) -> Result<Financing, StoreError> {
        let key = raw.0.clone();
        Ok(Financing {
            id: parse_uuid(&raw.0, "financing")?,
            user_id: parse_uuid(&raw.1, "financing")?,
            investment_id: parse_uuid(&raw.2, "financing")?,
            amount: parse_money(&raw.3, "financing", &key)?,
            installment_count: raw.4,
            installment_amount: parse_money(&raw.5, "financing", &key)?,
            remaining: parse_money(&raw.6, "financing", &key)?,
            penalty_amount: parse_money(&raw.7, "financing", &key)?,
            next_due_date: parse_opt_ts(raw.8, "financing", &key)?,
            status: parse_status::<FinancingStatus>(&raw.9, "financing", &key)?,
            created_at: parse_ts(&raw.10, "financing", &key)?,
            completed_at: parse_opt_ts(raw.11, "financing", &key)?,
            version: raw.12,
        })
    }

    const FINANCING_COLUMNS: &str = "id, user_id, investment_id, amount, installment_count,
         installment_amount, remaining, penalty_amount, next_due_date, status,
         created_at, completed_at, version";

    fn read_financing_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FinancingRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
            row.get(10)?,
            row.get(11)?,
            row.get(12)?,
        ))
    }

    pub(super) fn get_financing(conn: &Connection, id: Uuid) -> Result<Financing, StoreError> {
        let key = id.to_string();
        let sql = format!("SELECT {FINANCING_COLUMNS} FROM financings WHERE id = ?1");
        let raw = conn
            .query_row(&sql, params![key], read_financing_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound {
                    entity: "financing",
                    id: key.clone(),
                },
                other => StoreError::Database(other),
            })?;
        financing_from_row(raw)
    }

    pub(super) fn list_financings_for_investment(
        conn: &Connection,
        investment_id: Uuid,
    ) -> Result<Vec<Financing>, StoreError> {
        let sql = format!(
            "SELECT {FINANCING_COLUMNS} FROM financings WHERE investment_id = ?1 ORDER BY created_at"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![investment_id.to_string()], read_financing_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(financing_from_row).collect()
    }

    pub(super) fn update_financing(conn: &Connection, fin: &Financing) -> Result<(), StoreError> {
        let key = fin.id.to_string();
        let rows = conn.execute(
            "UPDATE financings
             SET remaining = ?2, penalty_amount = ?3, next_due_date = ?4, status = ?5,
                 completed_at = ?6, version = version + 1
             WHERE id = ?1 AND version = ?7",
            params![
                key,
                fin.remaining.value().to_string(),
                fin.penalty_amount.value().to_string(),
                fin.next_due_date.map(|t| t.to_rfc3339()),
                fin.status.to_string(),
                fin.completed_at.map(|t| t.to_rfc3339()),
                fin.version,
            ],
        )?;
        if rows == 0 {
            return Err(versioned_update_failed(
                conn,
                "financings",
                "id",
                "financing",
                &key,
            ));
        }
        Ok(())
    }

    // === installments ===

    pub(super) fn insert_installment(conn: &Connection, ins: &Installment) -> Result<(), StoreError> {
        conn.execute(
            "INSERT INTO installments
             (id, financing_id, number, amount, penalty_amount, total_due,
              due_date, status, paid_at, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                ins.id.to_string(),
                ins.financing_id.to_string(),
                ins.number,
                ins.amount.value().to_string(),
                ins.penalty_amount.value().to_string(),
                ins.total_due.value().to_string(),
                ins.due_date.to_rfc3339(),
                ins.status.to_string(),
                ins.paid_at.map(|t| t.to_rfc3339()),
                ins.version,
            ],
        )?;
        Ok(())
    }

    type InstallmentRow = (
        String,
        String,
        u32,
        String,
        String,
        String,
        String,
        String,
        Option<String>,
        i64,
    );

    fn installment_from_row(raw: InstallmentRow) -> Result<Installment, StoreError> {
        let key = raw.0.clone();
        Ok(Installment {
            id: parse_uuid(&raw.0, "installment")?,
            financing_id: parse_uuid(&raw.1, "installment")?,
            number: raw.2,
            amount: parse_money(&raw.3, "installment", &key)?,
            penalty_amount: parse_money(&raw.4, "installment", &key)?,
            total_due: parse_money(&raw.5, "installment", &key)?,
            due_date: parse_ts(&raw.6, "installment", &key)?,
            status: parse_status::<InstallmentStatus>(&raw.7, "installment", &key)?,
            paid_at: parse_opt_ts(raw.8, "installment", &key)?,
            version: raw.9,
        })
    }

    const INSTALLMENT_COLUMNS: &str = "id, financing_id, number, amount, penalty_amount,
         total_due, due_date, status, paid_at, version";

    fn read_installment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InstallmentRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
        ))
    }

    pub(super) fn get_installment(conn: &Connection, id: Uuid) -> Result<Installment, StoreError> {
        let key = id.to_string();
        let sql = format!("SELECT {INSTALLMENT_COLUMNS} FROM installments WHERE id = ?1");
        let raw = conn
            .query_row(&sql, params![key], read_installment_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound {
                    entity: "installment",
                    id: key.clone(),
                },
                other => StoreError::Database(other),
            })?;
        installment_from_row(raw)
    }

    pub(super) fn list_installments(
        conn: &Connection,
        financing_id: Uuid,
    ) -> Result<Vec<Installment>, StoreError> {
        let sql = format!(
            "SELECT {INSTALLMENT_COLUMNS} FROM installments WHERE financing_id = ?1 ORDER BY number"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![financing_id.to_string()], read_installment_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(installment_from_row).collect()
    }

    pub(super) fn update_installment(conn: &Connection, ins: &Installment) -> Result<(), StoreError> {
        let key = ins.id.to_string();
        let rows = conn.execute(
            "UPDATE installments
             SET penalty_amount = ?2, total_due = ?3, due_date = ?4, status = ?5,
                 paid_at = ?6, version = version + 1
             WHERE id = ?1 AND version = ?7",
            params![
                key,
                ins.penalty_amount.value().to_string(),
                ins.total_due.value().to_string(),
                ins.due_date.to_rfc3339(),
                ins.status.to_string(),
                ins.paid_at.map(|t| t.to_rfc3339()),
                ins.version,
            ],
        )?;
        if rows == 0 {
            return Err(versioned_update_failed(
                conn,
                "installments",
                "id",
                "installment",
                &key,
            ));
        }
        Ok(())
    }

    // === accounts ===

    pub(super) fn get_account(
        conn: &Connection,
        user_id: Uuid,
    ) -> Result<Option<AccountBalance>, StoreError> {
        let key = user_id.to_string();
        let raw = conn.query_row(
            "SELECT user_id, balance, version FROM accounts WHERE user_id = ?1",
            params![key],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        );
        match raw {
            Ok(raw) => Ok(Some(AccountBalance {
                user_id: parse_uuid(&raw.0, "account")?,
                balance: parse_money(&raw.1, "account", &key)?,
                version: raw.2,
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    pub(super) fn update_account(
        conn: &Connection,
        account: &AccountBalance,
    ) -> Result<(), StoreError> {
        let key = account.user_id.to_string();
        let rows = conn.execute(
            "UPDATE accounts SET balance = ?2, version = version + 1
             WHERE user_id = ?1 AND version = ?3",
            params![key, account.balance.value().to_string(), account.version],
        )?;
        if rows == 0 {
            return Err(versioned_update_failed(
                conn,
                "accounts",
                "user_id",
                "account",
                &key,
            ));
        }
        Ok(())
    }

    // === transactions ===

    pub(super) fn list_transactions_for_user(
        conn: &Connection,
        user_id: Uuid,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT id, kind, user_id, amount, metadata, created_at
             FROM transactions WHERE user_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt
            .query_map(params![user_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|raw| {
                let key = raw.0.clone();
                Ok(TransactionRecord {
                    id: parse_uuid(&raw.0, "transaction")?,
                    kind: parse_status::<TransactionKind>(&raw.1, "transaction", &key)?,
                    user_id: parse_uuid(&raw.2, "transaction")?,
                    amount: parse_money(&raw.3, "transaction", &key)?,
                    metadata: serde_json::from_str(&raw.4)?,
                    created_at: parse_ts(&raw.5, "transaction", &key)?,
                })
            })
            .collect()
    }
}
