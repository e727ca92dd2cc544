use std::sync::Arc;

use futures::future::join_all;

use crate_ledger::reward::{MAX_ITEM_VALUE, MIN_ITEM_VALUE};
use crate_ledger::{
    CrateCache, CrateCounts, CrateError, CrateService, LedgerStore, MemoryLedgerStore,
    MemoryTransactionLog, PlayerId, Rarity, RewardGenerator, ScriptedRandom, ThreadRandom,
};

struct Economy {
    service: Arc<CrateService>,
    store: Arc<MemoryLedgerStore>,
    log: Arc<MemoryTransactionLog>,
}

fn economy(generator: RewardGenerator) -> Economy {
    let store = Arc::new(MemoryLedgerStore::new());
    let log = Arc::new(MemoryTransactionLog::new());
    let service = Arc::new(CrateService::new(
        store.clone(),
        Arc::new(CrateCache::default()),
        log.clone(),
        generator,
    ));
    Economy {
        service,
        store,
        log,
    }
}

fn seeded() -> Economy {
    economy(RewardGenerator::with_rng(Arc::new(ThreadRandom::seeded(42))))
}

#[tokio::test]
async fn qa_open_lands_in_a_tier_bucket() {
    let eco = seeded();
    let p = PlayerId(500);
    eco.store.insert_account(p, CrateCounts::new([20, 20, 20, 20, 20]));

    for rarity in Rarity::ALL {
        for _ in 0..20 {
            let outcome = eco.service.open_crate(p, rarity).await.unwrap();
            let stat = outcome.item.stat();
            assert!(
                outcome.bucket.contains(stat),
                "{rarity}: stat {stat} outside {:?}",
                outcome.bucket
            );
            assert!((MIN_ITEM_VALUE..=MAX_ITEM_VALUE).contains(&outcome.item.value));
        }
    }

    assert_eq!(eco.service.crate_counts(p).await.unwrap().total(), 0);
    assert_eq!(eco.store.items_owned_by(p).await.unwrap().len(), 100);
    assert_eq!(eco.log.entries_for(p).len(), 100);
}

#[tokio::test]
async fn qa_scripted_draw_selects_rarest_bucket() {
    // draw 1 < 2 -> first (rarest) bucket of the tier
    let eco = economy(RewardGenerator::with_rng(Arc::new(ScriptedRandom::new(vec![1, 0, 0, 0, 0]))));
    let p = PlayerId(501);
    eco.store.insert_account(p, CrateCounts::default().with(Rarity::Rare, 1));

    let outcome = eco.service.open_crate(p, Rarity::Rare).await.unwrap();
    assert_eq!(outcome.bucket.weight, 20);
    assert_eq!((outcome.bucket.min_stat, outcome.bucket.max_stat), (35, 40));
    assert_eq!(outcome.item.damage, 35);
}

#[tokio::test]
async fn qa_trade_validation_precedes_mutation() {
    let eco = seeded();
    let (a, b) = (PlayerId(600), PlayerId(601));
    eco.store.insert_account(a, CrateCounts::default().with(Rarity::Common, 3));
    eco.store.insert_account(b, CrateCounts::default());

    let cases = [
        (a, a, "common", 1),
        (a, PlayerId::SYSTEM, "common", 1),
        (a, b, "epic", 1),
        (a, b, "common", 0),
        (a, b, "common", -4),
        (a, b, "common", 4),
    ];
    for (from, to, rarity, amount) in cases {
        let err = eco.service.trade(from, to, rarity, amount).await.unwrap_err();
        assert!(err.is_precondition(), "{err}");
    }

    assert_eq!(eco.store.crate_counts(a).await.unwrap()[Rarity::Common], 3);
    assert!(eco.log.is_empty());

    let receipt = eco.service.trade(a, b, " Common ", 3).await.unwrap();
    assert_eq!((receipt.sender_remaining, receipt.receiver_total), (0, 3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn qa_concurrent_opens_across_players() {
    const PLAYERS: u64 = 16;
    const CRATES: u64 = 10;
    let eco = seeded();
    for id in 0..PLAYERS {
        eco.store
            .insert_account(PlayerId(1000 + id), CrateCounts::default().with(Rarity::Magic, CRATES));
    }

    // one more request per player than crates held
    let calls = (0..PLAYERS).flat_map(|id| {
        let service = eco.service.clone();
        (0..=CRATES).map(move |_| {
            let service = service.clone();
            async move { service.open_crate(PlayerId(1000 + id), Rarity::Magic).await }
        })
    });
    let results = join_all(calls.map(tokio::spawn)).await;

    let mut ok = 0;
    for r in results {
        match r.unwrap() {
            Ok(_) => ok += 1,
            Err(CrateError::InsufficientCrates { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(ok, PLAYERS * CRATES);

    for id in 0..PLAYERS {
        let p = PlayerId(1000 + id);
        assert_eq!(eco.service.crate_counts(p).await.unwrap()[Rarity::Magic], 0);
        assert_eq!(eco.store.items_owned_by(p).await.unwrap().len() as u64, CRATES);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn qa_trade_ring_conserves_crates() {
    let eco = seeded();
    let players: Vec<PlayerId> = (0..5).map(|i| PlayerId(2000 + i)).collect();
    for &p in &players {
        eco.store
            .insert_account(p, CrateCounts::default().with(Rarity::Legendary, 20));
    }

    let trades = (0..200).map(|i| {
        let service = eco.service.clone();
        let from = players[i % players.len()];
        let to = players[(i + 1) % players.len()];
        async move { service.trade(from, to, "legendary", 1).await }
    });
    let results = join_all(trades.map(tokio::spawn)).await;
    let committed = results
        .into_iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();

    let mut total = 0;
    for &p in &players {
        let ledger = eco.store.crate_counts(p).await.unwrap()[Rarity::Legendary];
        assert_eq!(eco.service.crate_counts(p).await.unwrap()[Rarity::Legendary], ledger);
        total += ledger;
    }
    assert_eq!(total, 100);
    assert_eq!(eco.log.len(), committed);
}
