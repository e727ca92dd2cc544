//! Ledger
//!
//! Authoritative per-player crate counters, minted items and the
//! transaction log.

pub mod log;
pub mod memory;
pub mod pg;
pub mod schema;
pub mod store;
pub mod types;

pub use log::{MemoryTransactionLog, PgTransactionLog, TransactionLog};
pub use memory::{FailPoint, MemoryLedgerStore};
pub use pg::PgLedgerStore;
pub use store::LedgerStore;
pub use types::{Subject, TransactionData, TransactionEntry, TransferBalances};
