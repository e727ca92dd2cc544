//! In-memory ledger
//!
//! One async mutex per account; there is no store-wide lock, so operations
//! on different players run in parallel. A transfer locks both accounts in
//! ascending id order. Mutations are staged on copies and written back only
//! at commit, which gives rollback for free when a fail point fires.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::store::LedgerStore;
use super::types::TransferBalances;
use crate::core_types::PlayerId;
use crate::error::{CrateError, CrateResult, StoreError};
use crate::rarity::{CrateCounts, Rarity};
use crate::reward::Item;

/// Where an injected failure aborts a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// After the balance check, before any write
    BeforeWrite,
    /// Open: item staged, counter not yet decremented
    AfterItemInsert,
    /// Open: counter decremented. Transfer: sender debited, receiver not credited.
    AfterDebit,
    /// Every write staged, commit fails
    Commit,
}

#[derive(Debug, Default, Clone)]
struct Account {
    crates: CrateCounts,
    items: Vec<Item>,
}

#[derive(Default)]
pub struct MemoryLedgerStore {
    accounts: DashMap<PlayerId, Arc<Mutex<Account>>>,
    fail_point: StdMutex<Option<FailPoint>>,
    latency: StdMutex<Option<Duration>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account with the given counters, replacing any existing one
    pub fn insert_account(&self, player: PlayerId, crates: CrateCounts) {
        self.accounts.insert(
            player,
            Arc::new(Mutex::new(Account {
                crates,
                items: Vec::new(),
            })),
        );
    }

    /// Abort the next transaction that reaches `point`
    pub fn fail_once(&self, point: FailPoint) {
        *self.fail_point.lock().unwrap_or_else(|e| e.into_inner()) = Some(point);
    }

    /// Hold each transaction open for `latency` while its locks are taken
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(|e| e.into_inner()) = latency;
    }

    fn account(&self, player: PlayerId) -> CrateResult<Arc<Mutex<Account>>> {
        // Clone the Arc so no map guard is held across an await
        self.accounts
            .get(&player)
            .map(|a| a.value().clone())
            .ok_or(CrateError::UnknownPlayer(player))
    }

    fn check_fail(&self, point: FailPoint) -> Result<(), StoreError> {
        let mut guard = self.fail_point.lock().unwrap_or_else(|e| e.into_inner());
        if *guard == Some(point) {
            *guard = None;
            return Err(StoreError::Injected(match point {
                FailPoint::BeforeWrite => "before-write",
                FailPoint::AfterItemInsert => "after-item-insert",
                FailPoint::AfterDebit => "after-debit",
                FailPoint::Commit => "commit",
            }));
        }
        Ok(())
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(d) = latency {
            tokio::time::sleep(d).await;
        }
    }
}

fn insufficient(rarity: Rarity, available: u64, requested: u64) -> CrateError {
    CrateError::InsufficientCrates {
        rarity,
        available,
        requested,
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    fn name(&self) -> &'static str {
        "Memory"
    }

    async fn ensure_account(&self, player: PlayerId) -> CrateResult<bool> {
        let mut created = false;
        self.accounts.entry(player).or_insert_with(|| {
            created = true;
            Arc::new(Mutex::new(Account::default()))
        });
        Ok(created)
    }

    async fn crate_counts(&self, player: PlayerId) -> CrateResult<CrateCounts> {
        let account = self.account(player)?;
        let guard = account.lock().await;
        Ok(guard.crates)
    }

    async fn open_crate(&self, player: PlayerId, rarity: Rarity, item: &Item) -> CrateResult<u64> {
        let account = self.account(player)?;
        let mut guard = account.lock().await;
        self.simulate_latency().await;

        let available = guard.crates[rarity];
        if available < 1 {
            return Err(insufficient(rarity, available, 1));
        }
        self.check_fail(FailPoint::BeforeWrite)?;

        let mut staged = guard.clone();
        staged.items.push(item.clone());
        self.check_fail(FailPoint::AfterItemInsert)?;

        staged.crates[rarity] = available - 1;
        self.check_fail(FailPoint::AfterDebit)?;
        self.check_fail(FailPoint::Commit)?;

        *guard = staged;
        debug!(player = %player, rarity = %rarity, remaining = available - 1, "Memory open committed");
        Ok(available - 1)
    }

    async fn transfer_crates(
        &self,
        from: PlayerId,
        to: PlayerId,
        rarity: Rarity,
        amount: u64,
    ) -> CrateResult<TransferBalances> {
        if from == to {
            return Err(CrateError::SelfTransfer);
        }
        let sender = self.account(from)?;
        let receiver = self.account(to)?;

        let (mut sender_guard, mut receiver_guard) = if from < to {
            let s = sender.lock().await;
            let r = receiver.lock().await;
            (s, r)
        } else {
            let r = receiver.lock().await;
            let s = sender.lock().await;
            (s, r)
        };
        self.simulate_latency().await;

        let available = sender_guard.crates[rarity];
        if available < amount {
            return Err(insufficient(rarity, available, amount));
        }
        self.check_fail(FailPoint::BeforeWrite)?;

        let mut staged_sender = sender_guard.crates;
        let mut staged_receiver = receiver_guard.crates;

        staged_sender[rarity] = available - amount;
        self.check_fail(FailPoint::AfterDebit)?;

        let credited = staged_receiver[rarity].checked_add(amount).ok_or_else(|| {
            StoreError::Corrupt(format!("{rarity} counter overflow for player {to}"))
        })?;
        staged_receiver[rarity] = credited;
        self.check_fail(FailPoint::Commit)?;

        sender_guard.crates = staged_sender;
        receiver_guard.crates = staged_receiver;

        Ok(TransferBalances {
            sender: staged_sender[rarity],
            receiver: credited,
        })
    }

    async fn grant_crates(&self, player: PlayerId, rarity: Rarity, amount: u64) -> CrateResult<u64> {
        let account = self.account(player)?;
        let mut guard = account.lock().await;
        self.check_fail(FailPoint::Commit)?;

        let next = guard.crates[rarity].checked_add(amount).ok_or_else(|| {
            StoreError::Corrupt(format!("{rarity} counter overflow for player {player}"))
        })?;
        guard.crates[rarity] = next;
        Ok(next)
    }

    async fn items_owned_by(&self, player: PlayerId) -> CrateResult<Vec<Item>> {
        let account = self.account(player)?;
        let guard = account.lock().await;
        Ok(guard.items.clone())
    }
}
