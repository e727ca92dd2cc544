//! Reward Generator
//!
//! One draw in `[0, 10)` picks the stat bucket for the crate's rarity,
//! then the minter produces the item inside that bucket.

use std::sync::Arc;

use tracing::debug;

use super::item::Item;
use super::minter::{ItemMinter, MintRequest, RandomItemMinter};
use super::random::RandomSource;
use crate::core_types::PlayerId;
use crate::rarity::{self, DRAW_BOUND, Rarity, StatBucket};

/// A generated, not yet persisted, reward
#[derive(Debug, Clone)]
pub struct Reward {
    pub item: Item,
    pub bucket: StatBucket,
    pub draw: u32,
}

pub struct RewardGenerator {
    rng: Arc<dyn RandomSource>,
    minter: Arc<dyn ItemMinter>,
}

impl RewardGenerator {
    pub fn new(rng: Arc<dyn RandomSource>, minter: Arc<dyn ItemMinter>) -> Self {
        Self { rng, minter }
    }

    /// Bucket draw and item minting share one source
    pub fn with_rng(rng: Arc<dyn RandomSource>) -> Self {
        let minter = Arc::new(RandomItemMinter::new(rng.clone()));
        Self { rng, minter }
    }

    pub fn generate(&self, rarity: Rarity, owner: PlayerId) -> Reward {
        let draw = self.rng.next_int(DRAW_BOUND);
        let bucket = rarity::bucket_for_draw(rarity, draw);
        let item = self.minter.mint(&MintRequest::for_crate(
            bucket.min_stat,
            bucket.max_stat,
            owner,
        ));

        debug!(
            owner = %owner,
            rarity = %rarity,
            draw = draw,
            min_stat = bucket.min_stat,
            max_stat = bucket.max_stat,
            item_id = %item.id,
            "Reward generated"
        );

        Reward { item, bucket, draw }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reward::minter::{MAX_ITEM_VALUE, MIN_ITEM_VALUE};
    use crate::reward::random::{ScriptedRandom, ThreadRandom};

    #[test]
    fn test_draw_selects_bucket() {
        // (rarity, draw, min_stat, max_stat)
        let cases = [
            (Rarity::Common, 7, 1, 9),
            (Rarity::Common, 1, 20, 30),
            (Rarity::Uncommon, 4, 20, 29),
            (Rarity::Rare, 0, 35, 40),
            (Rarity::Magic, 5, 30, 34),
            (Rarity::Legendary, 2, 46, 48),
            (Rarity::Legendary, 9, 41, 45),
        ];
        for (rarity, draw, lo, hi) in cases {
            let rng = Arc::new(ScriptedRandom::new(vec![draw, 0, 1234, 17, 0]));
            let reward = RewardGenerator::with_rng(rng).generate(rarity, PlayerId(5));
            assert_eq!(reward.draw, draw);
            assert_eq!((reward.bucket.min_stat, reward.bucket.max_stat), (lo, hi));
            assert!(reward.bucket.contains(reward.item.stat()), "{rarity} draw {draw}");
        }
    }

    #[test]
    fn test_random_rewards_stay_in_table() {
        let generator = RewardGenerator::with_rng(Arc::new(ThreadRandom::seeded(3)));
        for rarity in Rarity::ALL {
            let buckets = rarity::buckets_for(rarity);
            let lo = buckets[2].min_stat;
            let hi = buckets[0].max_stat;
            for _ in 0..300 {
                let reward = generator.generate(rarity, PlayerId(5));
                let stat = reward.item.stat();
                assert!((lo..=hi).contains(&stat));
                assert!(reward.bucket.contains(stat));
                assert!((MIN_ITEM_VALUE..=MAX_ITEM_VALUE).contains(&reward.item.value));
                assert_eq!(reward.item.owner, PlayerId(5));
            }
        }
    }

    #[test]
    fn test_bucket_distribution() {
        let generator = RewardGenerator::with_rng(Arc::new(ThreadRandom::seeded(11)));
        let mut hits = [0u32; 3];
        let n = 20_000;
        for _ in 0..n {
            let reward = generator.generate(Rarity::Rare, PlayerId(5));
            hits[rarity::bucket_index_for_draw(reward.draw)] += 1;
        }
        for (i, bucket) in rarity::buckets_for(Rarity::Rare).iter().enumerate() {
            let pct = hits[i] as f64 * 100.0 / n as f64;
            assert!((pct - bucket.weight as f64).abs() < 2.0, "bucket {i}: {pct}%");
        }
    }
}
