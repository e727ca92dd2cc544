//! Cache Mirror
//!
//! In-memory read cache of per-player crate counters. The ledger stays
//! authoritative: after a commit the service applies the same change here
//! as a relative delta, so concurrent updates to one player compose in any
//! order. Entries expire after a TTL and reload from the ledger on the next
//! read.
//!
//! Each player slot carries a generation. A writer bumps it before touching
//! the ledger ([`CacheMirror::begin_write`]) and again when it applies its
//! delta; a reader takes the generation before reading the ledger and may
//! only fill the slot if nothing moved since. A delta is applied only to an
//! entry that was filled before its write began. An entry filled after that
//! may or may not already include the write, so it is evicted instead.
//! The cache can lag the ledger, it never runs ahead of it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::core_types::PlayerId;
use crate::error::CacheError;
use crate::rarity::{CrateCounts, Rarity};

/// Default TTL for cached counters
pub const TTL_SECONDS: u64 = 300;

#[async_trait]
pub trait CacheMirror: Send + Sync {
    /// Announce a ledger mutation for `player`. Call before the durable
    /// write and pass the token to [`CacheMirror::apply_delta`].
    async fn begin_write(&self, player: PlayerId) -> u64;

    async fn apply_delta(
        &self,
        player: PlayerId,
        rarity: Rarity,
        delta: i64,
        write_token: u64,
    ) -> Result<(), CacheError>;

    /// Fresh cached counters, if any
    async fn get(&self, player: PlayerId) -> Option<CrateCounts>;

    /// Take before reading the ledger, hand back to [`CacheMirror::fill`]
    async fn load_token(&self, player: PlayerId) -> u64;

    /// Install counters read from the ledger. Returns `false` and leaves the
    /// cache untouched if a write started since `token` was taken.
    async fn fill(&self, player: PlayerId, counts: CrateCounts, token: u64) -> bool;

    async fn invalidate(&self, player: PlayerId);
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    counts: CrateCounts,
    filled_at: u64,
    loaded_at: Instant,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    entry: Option<CacheEntry>,
}

pub struct CrateCache {
    /// One slot per player ever touched. Eviction clears the entry and keeps
    /// the slot: dropping it would reset the generation to 0 and let a fill
    /// holding an older token succeed.
    slots: DashMap<PlayerId, Slot>,
    ttl: Duration,
    fail_next: AtomicBool,
}

impl CrateCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            ttl,
            fail_next: AtomicBool::new(false),
        }
    }

    /// Make the next `apply_delta` fail, as an unreachable remote cache would
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.entry.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Peek at an entry regardless of TTL
    pub fn peek(&self, player: PlayerId) -> Option<CrateCounts> {
        self.slots.get(&player)?.entry.map(|e| e.counts)
    }
}

impl Default for CrateCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(TTL_SECONDS))
    }
}

#[async_trait]
impl CacheMirror for CrateCache {
    async fn begin_write(&self, player: PlayerId) -> u64 {
        let mut slot = self.slots.entry(player).or_default();
        slot.generation += 1;
        slot.generation
    }

    async fn apply_delta(
        &self,
        player: PlayerId,
        rarity: Rarity,
        delta: i64,
        write_token: u64,
    ) -> Result<(), CacheError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(CacheError::Unavailable("injected".to_string()));
        }

        let mut slot = self.slots.entry(player).or_default();
        slot.generation += 1;

        let Some(entry) = slot.entry.as_mut() else {
            return Ok(());
        };
        if entry.filled_at >= write_token {
            // Filled while this write was in flight
            slot.entry = None;
            return Ok(());
        }
        if entry.counts.apply_delta(rarity, delta).is_none() {
            slot.entry = None;
            return Err(CacheError::Underflow { player, rarity });
        }
        Ok(())
    }

    async fn get(&self, player: PlayerId) -> Option<CrateCounts> {
        let mut slot = self.slots.get_mut(&player)?;
        let entry = slot.entry?;
        if entry.loaded_at.elapsed() > self.ttl {
            slot.entry = None;
            return None;
        }
        Some(entry.counts)
    }

    async fn load_token(&self, player: PlayerId) -> u64 {
        self.slots.get(&player).map(|s| s.generation).unwrap_or(0)
    }

    async fn fill(&self, player: PlayerId, counts: CrateCounts, token: u64) -> bool {
        let mut slot = self.slots.entry(player).or_default();
        if slot.generation != token {
            return false;
        }
        slot.entry = Some(CacheEntry {
            counts,
            filled_at: token,
            loaded_at: Instant::now(),
        });
        true
    }

    async fn invalidate(&self, player: PlayerId) {
        let mut slot = self.slots.entry(player).or_default();
        slot.generation += 1;
        slot.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn put(cache: &CrateCache, player: PlayerId, counts: CrateCounts) {
        let token = cache.load_token(player).await;
        assert!(cache.fill(player, counts, token).await);
    }

    async fn delta(cache: &CrateCache, player: PlayerId, rarity: Rarity, d: i64) -> Result<(), CacheError> {
        let token = cache.begin_write(player).await;
        cache.apply_delta(player, rarity, d, token).await
    }

    #[tokio::test]
    async fn test_delta_on_cached_entry() {
        let cache = CrateCache::default();
        let p = PlayerId(7);
        put(&cache, p, CrateCounts::default().with(Rarity::Rare, 3)).await;

        delta(&cache, p, Rarity::Rare, -1).await.unwrap();
        delta(&cache, p, Rarity::Rare, 4).await.unwrap();
        assert_eq!(cache.get(p).await.unwrap()[Rarity::Rare], 6);
    }

    #[tokio::test]
    async fn test_delta_on_missing_entry_is_noop() {
        let cache = CrateCache::default();
        delta(&cache, PlayerId(7), Rarity::Common, -1).await.unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_underflow_evicts() {
        let cache = CrateCache::default();
        let p = PlayerId(7);
        put(&cache, p, CrateCounts::default()).await;

        let err = delta(&cache, p, Rarity::Magic, -1).await.unwrap_err();
        assert!(matches!(err, CacheError::Underflow { .. }));
        assert!(cache.peek(p).is_none());
    }

    #[tokio::test]
    async fn test_fill_rejected_after_write_started() {
        let cache = CrateCache::default();
        let p = PlayerId(7);
        let read_token = cache.load_token(p).await;
        // ledger read returns the pre-commit value 5, then a write commits
        let write_token = cache.begin_write(p).await;
        cache.apply_delta(p, Rarity::Common, -1, write_token).await.unwrap();

        assert!(!cache.fill(p, CrateCounts::default().with(Rarity::Common, 5), read_token).await);
        assert!(cache.peek(p).is_none());
    }

    #[tokio::test]
    async fn test_fill_during_write_is_evicted_not_double_counted() {
        let cache = CrateCache::default();
        let p = PlayerId(7);
        let write_token = cache.begin_write(p).await;
        // ledger commit to 4, a reader loads 4 before the delta lands
        let read_token = cache.load_token(p).await;
        assert!(cache.fill(p, CrateCounts::default().with(Rarity::Common, 4), read_token).await);

        cache.apply_delta(p, Rarity::Common, -1, write_token).await.unwrap();
        assert!(cache.peek(p).is_none());
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let cache = CrateCache::new(Duration::from_millis(10));
        let p = PlayerId(7);
        put(&cache, p, CrateCounts::default()).await;
        assert!(cache.get(p).await.is_some());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get(p).await.is_none());
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let cache = CrateCache::default();
        let p = PlayerId(7);
        put(&cache, p, CrateCounts::default().with(Rarity::Common, 1)).await;
        cache.fail_next();
        assert!(delta(&cache, p, Rarity::Common, -1).await.is_err());
        delta(&cache, p, Rarity::Common, -1).await.unwrap();
        assert_eq!(cache.peek(p).unwrap()[Rarity::Common], 0);
    }

    #[tokio::test]
    async fn test_generation_survives_eviction() {
        let cache = CrateCache::new(Duration::from_millis(10));
        let p = PlayerId(7);
        let stale = cache.load_token(p).await;
        let write_token = cache.begin_write(p).await;
        cache.apply_delta(p, Rarity::Common, 1, write_token).await.unwrap();

        put(&cache, p, CrateCounts::default().with(Rarity::Common, 1)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get(p).await.is_none());
        cache.invalidate(p).await;

        // a reader that started before the write must still be turned away
        assert!(cache.load_token(p).await > write_token);
        assert!(!cache.fill(p, CrateCounts::default(), stale).await);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = CrateCache::default();
        let p = PlayerId(7);
        put(&cache, p, CrateCounts::default()).await;
        cache.invalidate(p).await;
        assert!(cache.get(p).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deltas_compose() {
        let cache = Arc::new(CrateCache::default());
        let p = PlayerId(7);
        put(&cache, p, CrateCounts::default().with(Rarity::Common, 1000)).await;

        // Writers all begin before any delta lands, as overlapping
        // commits against one player would
        let mut tokens = Vec::new();
        for _ in 0..200 {
            tokens.push(cache.begin_write(p).await);
        }

        let mut handles = Vec::new();
        for (i, token) in tokens.into_iter().enumerate() {
            let cache = cache.clone();
            let d = if i % 2 == 0 { -3 } else { 2 };
            handles.push(tokio::spawn(async move {
                cache.apply_delta(p, Rarity::Common, d, token).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        // 100 * -3 + 100 * 2
        assert_eq!(cache.peek(p).unwrap()[Rarity::Common], 900);
    }
}
