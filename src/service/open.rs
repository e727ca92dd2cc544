//! Open-crate operation

use tracing::{debug, info};

use super::CrateService;
use super::announce::{Announcement, announcement_for};
use crate::core_types::PlayerId;
use crate::error::CrateResult;
use crate::ledger::TransactionEntry;
use crate::rarity::{Rarity, StatBucket};
use crate::reward::Item;

#[derive(Debug, Clone)]
pub struct OpenOutcome {
    pub item: Item,
    pub rarity: Rarity,
    /// Bucket picked by the draw
    pub bucket: StatBucket,
    pub draw: u32,
    /// Crates of this rarity left after the open
    pub remaining: u64,
    pub announcement: Option<Announcement>,
    /// `false` if the cache delta failed and the entry was invalidated
    pub cache_synced: bool,
    /// `false` if the transaction log append failed
    pub logged: bool,
}

impl CrateService {
    /// Consume one crate of `rarity` and mint its reward.
    ///
    /// The balance check, the item insert and the decrement commit together.
    /// With no crate of this rarity the call fails with `InsufficientCrates`
    /// and nothing is written.
    ///
    /// The reward is rolled before the ledger call, so a failed open still
    /// consumes draws from the random source.
    pub async fn open_crate(&self, player: PlayerId, rarity: Rarity) -> CrateResult<OpenOutcome> {
        debug!(player = %player, rarity = %rarity, "Open crate");

        let reward = self.generator.generate(rarity, player);

        let token = self.cache.begin_write(player).await;
        let remaining = self
            .mutate(&[player], self.store.open_crate(player, rarity, &reward.item))
            .await?;

        let cache_synced = self.sync_cache(player, rarity, -1, token).await;
        let logged = self
            .append_log(&TransactionEntry::item_minted(player, &reward.item))
            .await;

        info!(
            player = %player,
            rarity = %rarity,
            item_id = %reward.item.id,
            stat = reward.item.stat(),
            value = reward.item.value,
            remaining = remaining,
            "Crate opened"
        );

        let announcement = announcement_for(player, rarity, &reward.item);
        if let Some(a) = &announcement {
            info!(player = %player, rarity = %rarity, stat = a.stat, kind = %a.kind, "Public announcement: {}", a);
        }

        Ok(OpenOutcome {
            item: reward.item,
            rarity,
            bucket: reward.bucket,
            draw: reward.draw,
            remaining,
            announcement,
            cache_synced,
            logged,
        })
    }
}
