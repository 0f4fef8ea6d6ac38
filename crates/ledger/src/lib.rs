//! Lombard Ledger - durable relational state for the financing engine
//!
//! All financial state lives here. Five tables: investments, financings,
//! installments, accounts, transactions. Every mutating operation in the
//! engine runs inside a single [`LedgerStore::transaction`] unit; every
//! mutable row carries an optimistic version token checked on update.
//!
//! # Key Types
//! - `Investment` / `Financing` / `Installment`: the financing entities
//! - `AccountBalance`: per-user balance credited by liquidation surplus
//! - `TransactionRecord`: append-only money-movement log
//! - `LedgerStore` / `LedgerTx`: SQLite handle + transactional unit of work

pub mod account;
pub mod error;
pub mod financing;
pub mod installment;
pub mod investment;
pub mod store;
pub mod transaction;
pub mod validation;

pub use account::AccountBalance;
pub use error::StoreError;
pub use financing::{Financing, FinancingStatus};
pub use installment::{Installment, InstallmentStatus};
pub use investment::{Investment, InvestmentStatus};
pub use store::{LedgerStore, LedgerTx};
pub use transaction::{TransactionKind, TransactionRecord};
pub use validation::{check_credit_invariant, check_remaining_invariant};
