use std::{error::Error, time::Duration};

use api_types::{
    auth::AuthResponse,
    catalog::CatalogEntry,
    info::{CoinHistory, InfoResponse, InventoryItem, ReceivedCoins, SentCoins},
};
use clap::{Parser, Subcommand};
use engine::{AccountSummary, Engine, TransferCmd};
use migration::{Migrator, MigratorTrait};
use serde::Serialize;
use settings::Settings;

mod settings;

type AppResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "coinstore")]
#[command(about = "Virtual coin store: accounts, purchases and transfers")]
struct Cli {
    /// Database connection string, overrides `settings.toml` (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in as NAME, creating the account on first use.
    Auth { name: String },
    /// Buy one ITEM as NAME.
    Buy { name: String, item: String },
    /// Send AMOUNT coins from FROM to TO.
    Send {
        from: String,
        to: String,
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Balance, inventory and coin history of NAME.
    Info { name: String },
    /// List items and prices.
    Catalog,
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();
    let settings = Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "coinstore={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let engine = match bootstrap(&settings, cli.database_url.as_deref()).await {
        Ok(engine) => engine,
        Err(err) => {
            tracing::error!("failed to initialize storage: {err}");
            return Err(err);
        }
    };

    if let Err(err) = run(&engine, cli.command).await {
        tracing::debug!("command failed: {err:?}");
        eprintln!("{err}");
        std::process::exit(1);
    }
    Ok(())
}

/// Connect, migrate and seed the catalog, then hand back a ready engine.
async fn bootstrap(settings: &Settings, database_url: Option<&str>) -> AppResult<Engine> {
    let url = database_url
        .map(str::to_string)
        .unwrap_or_else(|| settings.database.url());

    let database = sea_orm::Database::connect(&url).await?;
    Migrator::up(&database, None).await?;

    let mut builder = Engine::builder().database(database);
    if let Some(ms) = settings.unit_timeout_ms {
        builder = builder.unit_timeout(Duration::from_millis(ms));
    }
    let engine = builder.build().await?;

    let inserted = engine.seed_catalog().await?;
    tracing::info!(inserted, "storage ready");
    Ok(engine)
}

async fn run(engine: &Engine, command: Command) -> AppResult<()> {
    match command {
        Command::Auth { name } => {
            let id = engine.create_or_authenticate(&name).await?;
            print_json(&AuthResponse { id })
        }
        Command::Buy { name, item } => {
            let id = engine.create_or_authenticate(&name).await?;
            engine.purchase(id, &item).await?;
            print_json(&info_response(engine.summary(id).await?))
        }
        Command::Send { from, to, amount } => {
            let id = engine.create_or_authenticate(&from).await?;
            engine.transfer(TransferCmd::new(id, to, amount)).await?;
            print_json(&info_response(engine.summary(id).await?))
        }
        Command::Info { name } => {
            let id = engine.create_or_authenticate(&name).await?;
            print_json(&info_response(engine.summary(id).await?))
        }
        Command::Catalog => {
            let entries: Vec<CatalogEntry> = engine
                .catalog()
                .await?
                .into_iter()
                .map(|item| CatalogEntry {
                    name: item.name,
                    price: item.price,
                })
                .collect();
            print_json(&entries)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn info_response(summary: AccountSummary) -> InfoResponse {
    InfoResponse {
        coins: summary.balance,
        inventory: summary
            .inventory
            .into_iter()
            .map(|(kind, quantity)| InventoryItem { kind, quantity })
            .collect(),
        coin_history: CoinHistory {
            received: summary
                .received
                .into_iter()
                .map(|t| ReceivedCoins {
                    from_user: t.counterparty,
                    amount: t.amount,
                })
                .collect(),
            sent: summary
                .sent
                .into_iter()
                .map(|t| SentCoins {
                    to_user: t.counterparty,
                    amount: t.amount,
                })
                .collect(),
        },
    }
}
