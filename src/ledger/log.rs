//! Transaction log
//!
//! Append-only audit trail. Entries are written after the ledger commit
//! they describe.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use super::types::TransactionEntry;
use crate::core_types::PlayerId;
use crate::error::StoreError;

#[async_trait]
pub trait TransactionLog: Send + Sync {
    async fn record(&self, entry: &TransactionEntry) -> Result<(), StoreError>;
}

pub struct PgTransactionLog {
    pool: PgPool,
}

impl PgTransactionLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionLog for PgTransactionLog {
    async fn record(&self, entry: &TransactionEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO transactions ("from", "to", subject, data, "timestamp")
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.from.as_db())
        .bind(entry.to.as_db())
        .bind(entry.subject.as_str())
        .bind(Json(&entry.data))
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Log kept in memory, with an injectable append failure
#[derive(Default)]
pub struct MemoryTransactionLog {
    entries: Mutex<Vec<TransactionEntry>>,
    fail_next: AtomicBool,
}

impl MemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn entries(&self) -> Vec<TransactionEntry> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn entries_for(&self, player: PlayerId) -> Vec<TransactionEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.from == player || e.to == player)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TransactionLog for MemoryTransactionLog {
    async fn record(&self, entry: &TransactionEntry) -> Result<(), StoreError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Injected("transaction-log"));
        }
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry.clone());
        Ok(())
    }
}
