//! Ledger store seam
//!
//! Every mutating method is one atomic unit: the balance check and the
//! counter updates happen inside the same transaction, so two concurrent
//! operations on one player can never drive a counter below zero.

use async_trait::async_trait;

use super::types::TransferBalances;
use crate::core_types::PlayerId;
use crate::error::CrateResult;
use crate::rarity::{CrateCounts, Rarity};
use crate::reward::Item;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Create an empty account. Returns `false` if it already existed.
    async fn ensure_account(&self, player: PlayerId) -> CrateResult<bool>;

    async fn crate_counts(&self, player: PlayerId) -> CrateResult<CrateCounts>;

    /// Check `crates[rarity] >= 1`, persist `item`, decrement the counter.
    ///
    /// Returns the remaining count. Fails with `InsufficientCrates` and
    /// writes nothing when the player has no crate of this rarity.
    async fn open_crate(&self, player: PlayerId, rarity: Rarity, item: &Item) -> CrateResult<u64>;

    /// Move `amount` crates from `from` to `to`, both-or-neither.
    async fn transfer_crates(
        &self,
        from: PlayerId,
        to: PlayerId,
        rarity: Rarity,
        amount: u64,
    ) -> CrateResult<TransferBalances>;

    /// Credit crates from the system (votes, daily rewards, events).
    /// Returns the new count.
    async fn grant_crates(&self, player: PlayerId, rarity: Rarity, amount: u64) -> CrateResult<u64>;

    async fn items_owned_by(&self, player: PlayerId) -> CrateResult<Vec<Item>>;
}
