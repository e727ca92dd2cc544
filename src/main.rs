//! Crate Ledger - command front end
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌──────────┐    ┌──────────┐
//! │  Config  │───▶│ CrateService │───▶│ Postgres │───▶│  Cache   │
//! │  (YAML)  │    │ (open/trade) │    │ (ledger) │    │ (delta)  │
//! └──────────┘    └──────────────┘    └──────────┘    └──────────┘
//! ```
//!
//! Usage:
//!
//! ```text
//! crate_ledger [--env dev] init-schema
//! crate_ledger [--env dev] crates <player>
//! crate_ledger [--env dev] open <player> [rarity]
//! crate_ledger [--env dev] trade <from> <to> [amount] [rarity]
//! crate_ledger [--env dev] grant <player> <rarity> <amount>
//! ```

use std::sync::Arc;

use anyhow::{Context, anyhow, bail};

use crate_ledger::config::AppConfig;
use crate_ledger::db::Database;
use crate_ledger::ledger::schema;
use crate_ledger::{
    CrateCache, CrateError, CrateService, PgLedgerStore, PgTransactionLog, PlayerId, Rarity,
    RewardGenerator, ThreadRandom,
};

const DEFAULT_RARITY: Rarity = Rarity::Common;
const DEFAULT_AMOUNT: i64 = 1;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Positional arguments with `--env <name>` removed
fn get_command_args() -> Vec<String> {
    let mut out = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--env" || arg == "-e" {
            args.next();
            continue;
        }
        out.push(arg);
    }
    out
}

fn parse_player(arg: Option<&String>, what: &str) -> anyhow::Result<PlayerId> {
    let raw = arg.ok_or_else(|| anyhow!("Missing {what}"))?;
    raw.parse()
        .with_context(|| format!("Invalid {what}: {raw}"))
}

fn parse_rarity(arg: Option<&String>) -> Result<Rarity, CrateError> {
    arg.map_or(Ok(DEFAULT_RARITY), |r| r.parse())
}

fn parse_amount(arg: Option<&String>) -> anyhow::Result<i64> {
    match arg {
        Some(raw) => raw.parse().with_context(|| format!("Invalid amount: {raw}")),
        None => Ok(DEFAULT_AMOUNT),
    }
}

fn build_service(config: &AppConfig, db: &Database) -> CrateService {
    let store = Arc::new(PgLedgerStore::new(db.pool().clone()));
    let log = Arc::new(PgTransactionLog::new(db.pool().clone()));
    let cache = Arc::new(CrateCache::new(config.cache.ttl()));
    let generator = RewardGenerator::with_rng(Arc::new(ThreadRandom::new()));

    CrateService::new(store, cache, log, generator).with_op_timeout(config.store.op_timeout())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = crate_ledger::logging::init_logging(&app_config)?;

    tracing::info!("Starting crate ledger in {} mode", env);

    let args = get_command_args();
    let Some(command) = args.first() else {
        bail!("Usage: crate_ledger [--env <env>] <init-schema|crates|open|trade|grant> ...");
    };

    let url = app_config
        .database_url()
        .ok_or_else(|| anyhow!("postgres_url is not configured and DATABASE_URL is unset"))?;
    let db = Database::from_config(&url, &app_config.store)
        .await
        .context("Failed to connect to PostgreSQL")?;
    db.health_check().await.context("PostgreSQL health check failed")?;

    if command == "init-schema" {
        schema::init_schema(db.pool()).await?;
        println!("Schema initialized");
        return Ok(());
    }

    let service = build_service(&app_config, &db);

    match command.as_str() {
        "crates" => {
            let player = parse_player(args.get(1), "player")?;
            let counts = service.crate_counts(player).await?;
            println!("Crates for player {player}:");
            for (rarity, count) in counts.iter() {
                println!("  {:<10} {}", rarity, count);
            }
        }
        "open" => {
            let player = parse_player(args.get(1), "player")?;
            let rarity = parse_rarity(args.get(2))?;
            let outcome = service.open_crate(player, rarity).await?;
            println!(
                "Opened a {} crate: {} ({} {}, value {})",
                rarity,
                outcome.item.name,
                outcome.item.stat(),
                outcome.item.stat_kind(),
                outcome.item.value
            );
            println!("{} {} crates left", outcome.remaining, rarity);
            if let Some(announcement) = outcome.announcement {
                println!("{announcement}");
            }
        }
        "trade" => {
            let from = parse_player(args.get(1), "sender")?;
            let to = parse_player(args.get(2), "receiver")?;
            let amount = parse_amount(args.get(3))?;
            let rarity = args.get(4).map_or(DEFAULT_RARITY.as_str(), |r| r.as_str());
            let receipt = service.trade(from, to, rarity, amount).await?;
            println!(
                "Player {} traded {} {} crates to player {} ({} left)",
                from,
                receipt.request.amount(),
                receipt.request.rarity(),
                to,
                receipt.sender_remaining
            );
        }
        "grant" => {
            let player = parse_player(args.get(1), "player")?;
            let rarity: Rarity = args
                .get(2)
                .ok_or_else(|| anyhow!("Missing rarity"))?
                .parse()?;
            let amount = parse_amount(args.get(3))?;
            if service.ensure_account(player).await? {
                tracing::info!(player = %player, "Created account");
            }
            let count = service.grant_crates(player, rarity, amount).await?;
            println!("Player {player} now has {count} {rarity} crates");
        }
        other => bail!("Unknown command: {other}"),
    }

    Ok(())
}
