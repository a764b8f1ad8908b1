//! One-shot oracle updater: acquire a value (random or aggregated price),
//! fixed-point encode it, and commit it to a contract over JSON-RPC.

pub mod api;
pub mod core;
pub mod ledger;
pub mod oracle;

pub use crate::core::{Config, OracleError, OracleResult};
pub use crate::oracle::{Oracle, TransactionRecord};
