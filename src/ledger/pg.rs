//! PostgreSQL ledger
//!
//! Each mutating call runs in one transaction. The counter row is locked
//! with `SELECT ... FOR UPDATE` before the balance check, so the check and
//! the decrement cannot be split by a concurrent request. Dropping the
//! transaction without commit rolls every statement back.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, error};

use super::store::LedgerStore;
use super::types::TransferBalances;
use crate::core_types::{ItemId, PlayerId};
use crate::error::{CrateError, CrateResult, StoreError};
use crate::rarity::{CrateCounts, Rarity};
use crate::reward::{Item, ItemType};

pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_counts(row: &PgRow) -> CrateResult<CrateCounts> {
        let mut counts = CrateCounts::default();
        for rarity in Rarity::ALL {
            let v: i64 = row.try_get(rarity.column())?;
            counts[rarity] = to_count(v)?;
        }
        Ok(counts)
    }

    fn row_to_item(row: &PgRow) -> CrateResult<Item> {
        let id: String = row.try_get("id")?;
        let id: ItemId = id
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("Invalid item id: {id}")))?;
        let item_type: String = row.try_get("type")?;
        let item_type: ItemType = item_type.parse().map_err(StoreError::Corrupt)?;

        Ok(Item {
            id,
            name: row.try_get("name")?,
            item_type,
            damage: row.try_get::<i32, _>("damage")? as u32,
            armor: row.try_get::<i32, _>("armor")? as u32,
            value: row.try_get::<i32, _>("value")? as u32,
            owner: PlayerId::from_db(row.try_get("owner")?),
        })
    }
}

fn to_count(v: i64) -> Result<u64, StoreError> {
    u64::try_from(v).map_err(|_| StoreError::Corrupt(format!("Negative crate counter: {v}")))
}

fn to_db_amount(amount: u64) -> Result<i64, StoreError> {
    i64::try_from(amount).map_err(|_| StoreError::Corrupt(format!("Amount out of range: {amount}")))
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    fn name(&self) -> &'static str {
        "Postgres"
    }

    async fn ensure_account(&self, player: PlayerId) -> CrateResult<bool> {
        let result = sqlx::query(r#"INSERT INTO profile ("user") VALUES ($1) ON CONFLICT DO NOTHING"#)
            .bind(player.as_db())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn crate_counts(&self, player: PlayerId) -> CrateResult<CrateCounts> {
        let row = sqlx::query(
            r#"
            SELECT crates_common, crates_uncommon, crates_rare, crates_magic, crates_legendary
            FROM profile WHERE "user" = $1
            "#,
        )
        .bind(player.as_db())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CrateError::UnknownPlayer(player))?;

        Self::row_to_counts(&row)
    }

    async fn open_crate(&self, player: PlayerId, rarity: Rarity, item: &Item) -> CrateResult<u64> {
        let col = rarity.column();
        let mut tx = self.pool.begin().await?;

        let lock_sql = format!(r#"SELECT {col} FROM profile WHERE "user" = $1 FOR UPDATE"#);
        let available: Option<i64> = sqlx::query_scalar(&lock_sql)
            .bind(player.as_db())
            .fetch_optional(&mut *tx)
            .await?;

        let available = match available {
            Some(v) => to_count(v)?,
            None => {
                let _ = tx.rollback().await;
                return Err(CrateError::UnknownPlayer(player));
            }
        };

        if available < 1 {
            let _ = tx.rollback().await;
            debug!(player = %player, rarity = %rarity, "Open rejected: no crates");
            return Err(CrateError::InsufficientCrates {
                rarity,
                available,
                requested: 1,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO allitems (id, owner, name, type, damage, armor, value)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item.id.to_string())
        .bind(item.owner.as_db())
        .bind(&item.name)
        .bind(item.item_type.as_str())
        .bind(item.damage as i32)
        .bind(item.armor as i32)
        .bind(item.value as i32)
        .execute(&mut *tx)
        .await?;

        let decrement_sql =
            format!(r#"UPDATE profile SET {col} = {col} - 1 WHERE "user" = $1 RETURNING {col}"#);
        let remaining: i64 = sqlx::query_scalar(&decrement_sql)
            .bind(player.as_db())
            .fetch_one(&mut *tx)
            .await?;

        if let Err(e) = tx.commit().await {
            error!(player = %player, rarity = %rarity, error = %e, "Failed to commit crate open");
            return Err(e.into());
        }

        Ok(to_count(remaining)?)
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
        let col = rarity.column();
        let db_amount = to_db_amount(amount)?;
        let mut tx = self.pool.begin().await?;

        // Lock both rows in key order so opposite trades cannot deadlock
        let lock_sql = format!(
            r#"SELECT "user", {col} FROM profile WHERE "user" = ANY($1) ORDER BY "user" FOR UPDATE"#
        );
        let rows = sqlx::query(&lock_sql)
            .bind(vec![from.as_db(), to.as_db()])
            .fetch_all(&mut *tx)
            .await?;

        let mut sender_balance = None;
        let mut receiver_found = false;
        for row in &rows {
            let user = PlayerId::from_db(row.try_get("user")?);
            if user == from {
                sender_balance = Some(to_count(row.try_get(col)?)?);
            } else if user == to {
                receiver_found = true;
            }
        }

        let available = match sender_balance {
            Some(v) => v,
            None => {
                let _ = tx.rollback().await;
                return Err(CrateError::UnknownPlayer(from));
            }
        };
        if !receiver_found {
            let _ = tx.rollback().await;
            return Err(CrateError::UnknownPlayer(to));
        }
        if available < amount {
            let _ = tx.rollback().await;
            return Err(CrateError::InsufficientCrates {
                rarity,
                available,
                requested: amount,
            });
        }

        let debit_sql =
            format!(r#"UPDATE profile SET {col} = {col} - $1 WHERE "user" = $2 RETURNING {col}"#);
        let sender: i64 = sqlx::query_scalar(&debit_sql)
            .bind(db_amount)
            .bind(from.as_db())
            .fetch_one(&mut *tx)
            .await?;

        let credit_sql =
            format!(r#"UPDATE profile SET {col} = {col} + $1 WHERE "user" = $2 RETURNING {col}"#);
        let receiver: i64 = sqlx::query_scalar(&credit_sql)
            .bind(db_amount)
            .bind(to.as_db())
            .fetch_one(&mut *tx)
            .await?;

        if let Err(e) = tx.commit().await {
            error!(from = %from, to = %to, rarity = %rarity, error = %e, "Failed to commit crate trade");
            return Err(e.into());
        }

        Ok(TransferBalances {
            sender: to_count(sender)?,
            receiver: to_count(receiver)?,
        })
    }

    async fn grant_crates(&self, player: PlayerId, rarity: Rarity, amount: u64) -> CrateResult<u64> {
        let col = rarity.column();
        let sql = format!(r#"UPDATE profile SET {col} = {col} + $1 WHERE "user" = $2 RETURNING {col}"#);
        let next: Option<i64> = sqlx::query_scalar(&sql)
            .bind(to_db_amount(amount)?)
            .bind(player.as_db())
            .fetch_optional(&self.pool)
            .await?;

        match next {
            Some(v) => Ok(to_count(v)?),
            None => Err(CrateError::UnknownPlayer(player)),
        }
    }

    async fn items_owned_by(&self, player: PlayerId) -> CrateResult<Vec<Item>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner, name, type, damage, armor, value
            FROM allitems WHERE owner = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(player.as_db())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_item).collect()
    }
}
