//! Ledger schema

use sqlx::PgPool;

const CREATE_PROFILE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS profile (
    "user"            BIGINT PRIMARY KEY,
    crates_common     BIGINT NOT NULL DEFAULT 0 CHECK (crates_common >= 0),
    crates_uncommon   BIGINT NOT NULL DEFAULT 0 CHECK (crates_uncommon >= 0),
    crates_rare       BIGINT NOT NULL DEFAULT 0 CHECK (crates_rare >= 0),
    crates_magic      BIGINT NOT NULL DEFAULT 0 CHECK (crates_magic >= 0),
    crates_legendary  BIGINT NOT NULL DEFAULT 0 CHECK (crates_legendary >= 0)
)
"#;

const CREATE_ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS allitems (
    id          TEXT PRIMARY KEY,
    owner       BIGINT NOT NULL REFERENCES profile ("user"),
    name        TEXT NOT NULL,
    type        TEXT NOT NULL,
    damage      INTEGER NOT NULL DEFAULT 0,
    armor       INTEGER NOT NULL DEFAULT 0,
    value       INTEGER NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_ITEMS_OWNER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS allitems_owner_idx ON allitems (owner)";

const CREATE_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id           BIGSERIAL PRIMARY KEY,
    "from"       BIGINT NOT NULL,
    "to"         BIGINT NOT NULL,
    subject      TEXT NOT NULL,
    data         JSONB NOT NULL,
    "timestamp"  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// Create tables if missing. Idempotent.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Initializing ledger schema...");
    for ddl in [
        CREATE_PROFILE_TABLE,
        CREATE_ITEMS_TABLE,
        CREATE_ITEMS_OWNER_INDEX,
        CREATE_TRANSACTIONS_TABLE,
    ] {
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!("Ledger schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rarity::Rarity;

    #[test]
    fn test_profile_has_every_counter_column() {
        for rarity in Rarity::ALL {
            assert!(CREATE_PROFILE_TABLE.contains(rarity.column()), "{rarity}");
        }
    }
}
