//! Error types for crate operations
//!
//! Precondition failures are user-input shaped and never retried.
//! `DurableStore` aborts the operation with nothing committed.
//! Cache failures never surface here; see [`CacheError`].

use std::time::Duration;

use thiserror::Error;

use crate::core_types::PlayerId;
use crate::rarity::Rarity;

#[derive(Debug, Error)]
pub enum CrateError {
    #[error("{0} is not a valid rarity")]
    InvalidRarity(String),

    #[error("Amount must be greater than 0, got {0}")]
    InvalidAmount(i64),

    #[error("Insufficient {rarity} crates: available {available}, requested {requested}")]
    InsufficientCrates {
        rarity: Rarity,
        available: u64,
        requested: u64,
    },

    #[error("Cannot trade crates to yourself")]
    SelfTransfer,

    #[error("Cannot trade crates to the system account")]
    SystemTransfer,

    #[error("Player {0} has no account")]
    UnknownPlayer(PlayerId),

    #[error("Durable store failure: {0}")]
    DurableStore(#[from] StoreError),
}

impl CrateError {
    /// Detected before any mutation
    pub fn is_precondition(&self) -> bool {
        !matches!(self, CrateError::DurableStore(_))
    }
}

impl From<sqlx::Error> for CrateError {
    fn from(e: sqlx::Error) -> Self {
        CrateError::DurableStore(StoreError::Database(e))
    }
}

/// Failure of the durable store; nothing is assumed committed
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Injected failure at {0}")]
    Injected(&'static str),

    #[error("Corrupt ledger row: {0}")]
    Corrupt(String),
}

/// Cache mirror sync failure. Logged, never reported as an operation failure.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cached {rarity} counter for player {player} would underflow")]
    Underflow { player: PlayerId, rarity: Rarity },
}

pub type CrateResult<T> = Result<T, CrateError>;
