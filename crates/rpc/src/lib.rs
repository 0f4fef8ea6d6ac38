//! Lombard RPC - operator-facing orchestrator
//!
//! Wires the ledger store, rate provider, audit trail and lifecycle
//! engine together from a data directory, and exposes the command
//! handlers used by the CLI binary.

pub mod commands;
pub mod context;

pub use context::AppContext;
