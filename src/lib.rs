//! Crate Ledger - loot crate economy core
//!
//! Players hold counters of unopened crates in five rarity tiers. Opening a
//! crate consumes one and mints an item whose stat is drawn from the tier's
//! weighted buckets; crates can also be traded between players. The durable
//! ledger is authoritative, a cache mirrors the counters and every committed
//! change is appended to a transaction log.
//!
//! # Modules
//!
//! - [`core_types`] - Player and item identifiers
//! - [`rarity`] - Rarity tiers, stat buckets and crate counters
//! - [`reward`] - Random source, item minting and reward generation
//! - [`ledger`] - Durable store, transaction log and schema
//! - [`cache`] - Cache mirror of crate counters
//! - [`service`] - Open and trade operations
//! - [`error`] - Error types
//! - [`config`] / [`logging`] / [`db`] - Ambient setup

// Core types - must be first!
pub mod core_types;

pub mod rarity;
pub mod reward;

pub mod cache;
pub mod ledger;
pub mod service;

pub mod config;
pub mod db;
pub mod error;
pub mod logging;

// Convenient re-exports at crate root
pub use cache::{CacheMirror, CrateCache};
pub use core_types::{ItemId, PlayerId};
pub use error::{CacheError, CrateError, CrateResult, StoreError};
pub use ledger::{
    FailPoint, LedgerStore, MemoryLedgerStore, MemoryTransactionLog, PgLedgerStore,
    PgTransactionLog, TransactionEntry, TransactionLog,
};
pub use rarity::{CrateCounts, Rarity, StatBucket};
pub use reward::{Item, ItemType, RandomSource, RewardGenerator, ScriptedRandom, ThreadRandom};
pub use service::{Announcement, CrateService, OpenOutcome, TradeReceipt, TradeRequest};
