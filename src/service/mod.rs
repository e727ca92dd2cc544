//! Crate Service
//!
//! Entry point for the command front end. Each operation runs as one
//! independent unit of work:
//!
//! ```text
//! front end ──▶ CrateService ──▶ LedgerStore (one transaction)
//!                    │                 │ commit
//!                    │                 ▼
//!                    ├──────────▶ CacheMirror (delta)
//!                    └──────────▶ TransactionLog (append)
//! ```
//!
//! Only the ledger transaction decides success. Cache and log writes happen
//! after commit; their failures are logged and reported on the outcome.

pub mod announce;
pub mod open;
pub mod trade;


use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::cache::CacheMirror;
use crate::core_types::PlayerId;
use crate::error::{CrateError, CrateResult, StoreError};
use crate::ledger::{LedgerStore, TransactionEntry, TransactionLog};
use crate::rarity::{CrateCounts, Rarity};
use crate::reward::RewardGenerator;

pub use announce::{Announcement, MAGIC_ANNOUNCE_THRESHOLD, announcement_for};
pub use open::OpenOutcome;
pub use trade::{TradeReceipt, TradeRequest};

/// Default bound on a single durable-store call
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(5);

pub struct CrateService {
    store: Arc<dyn LedgerStore>,
    cache: Arc<dyn CacheMirror>,
    log: Arc<dyn TransactionLog>,
    generator: RewardGenerator,
    op_timeout: Duration,
}

impl CrateService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        cache: Arc<dyn CacheMirror>,
        log: Arc<dyn TransactionLog>,
        generator: RewardGenerator,
    ) -> Self {
        Self {
            store,
            cache,
            log,
            generator,
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    /// Current crate counters, served from the cache when fresh
    pub async fn crate_counts(&self, player: PlayerId) -> CrateResult<CrateCounts> {
        if let Some(counts) = self.cache.get(player).await {
            return Ok(counts);
        }

        let token = self.cache.load_token(player).await;
        let counts = self.durable(self.store.crate_counts(player)).await?;
        if !self.cache.fill(player, counts, token).await {
            debug!(player = %player, "Cache fill skipped: concurrent write");
        }
        Ok(counts)
    }

    /// Credit crates from the system account
    pub async fn grant_crates(&self, player: PlayerId, rarity: Rarity, amount: i64) -> CrateResult<u64> {
        let amount = positive_amount(amount)?;

        let token = self.cache.begin_write(player).await;
        let count = self
            .mutate(&[player], self.store.grant_crates(player, rarity, amount))
            .await?;

        self.sync_cache(player, rarity, amount as i64, token).await;
        self.append_log(&TransactionEntry::crates_granted(player, rarity, amount))
            .await;
        Ok(count)
    }

    /// Create the player's ledger row if missing
    pub async fn ensure_account(&self, player: PlayerId) -> CrateResult<bool> {
        self.durable(self.store.ensure_account(player)).await
    }

    /// Run a durable-store call under the operation timeout.
    ///
    /// A timeout is reported as a failure and never retried. The store may
    /// still have committed, so callers re-read before retrying.
    async fn durable<T>(&self, fut: impl Future<Output = CrateResult<T>>) -> CrateResult<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                error!(store = self.store.name(), timeout = ?self.op_timeout, "Durable store call timed out");
                Err(CrateError::DurableStore(StoreError::Timeout(self.op_timeout)))
            }
        }
    }

    /// Run a mutating store call. On a store failure the commit may or may
    /// not have happened (a timeout can fire after the commit), so the
    /// cached counters of every player involved are dropped and the next
    /// read goes to the ledger.
    async fn mutate<T>(
        &self,
        players: &[PlayerId],
        fut: impl Future<Output = CrateResult<T>>,
    ) -> CrateResult<T> {
        let result = self.durable(fut).await;
        if let Err(CrateError::DurableStore(e)) = &result {
            for &player in players {
                self.cache.invalidate(player).await;
            }
            warn!(players = ?players, error = %e, "Store outcome unknown, cached counters invalidated");
        }
        result
    }

    /// Apply a committed change to the cache. Never fails the operation.
    async fn sync_cache(&self, player: PlayerId, rarity: Rarity, delta: i64, token: u64) -> bool {
        match self.cache.apply_delta(player, rarity, delta, token).await {
            Ok(()) => true,
            Err(e) => {
                warn!(player = %player, rarity = %rarity, delta = delta, error = %e, "Cache sync failed, invalidating");
                self.cache.invalidate(player).await;
                false
            }
        }
    }

    async fn append_log(&self, entry: &TransactionEntry) -> bool {
        match self.log.record(entry).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    from = %entry.from,
                    to = %entry.to,
                    subject = %entry.subject,
                    error = %e,
                    "Failed to append transaction log entry"
                );
                false
            }
        }
    }
}

fn positive_amount(amount: i64) -> CrateResult<u64> {
    if amount <= 0 {
        return Err(CrateError::InvalidAmount(amount));
    }
    Ok(amount as u64)
}
