use clap::{Parser, Subcommand};
use core_types::{normalize_ticker, Symbol};
use database::connection::{connect, run_migrations};
use database::repository::DbRepository;
use engine::ExecutionEngine;
use market_calendar::MarketCalendar;
use rust_decimal::Decimal;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// The main entry point for the Bourse trading backend.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if present.
    dotenvy::dotenv().ok();

    // Structured logging, filterable via RUST_LOG.
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("bourse=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Load the typed configuration and initialize the database.
    let config = configuration::load_config()?;
    let db_pool = connect().await?;
    run_migrations(&db_pool).await?;
    let db_repo = DbRepository::new(db_pool);

    let calendar = MarketCalendar::from_offset_minutes(config.market.utc_offset_minutes)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "market.utc_offset_minutes out of range: {}",
                config.market.utc_offset_minutes
            )
        })?;
    let trading_engine = ExecutionEngine::new(db_repo.clone(), calendar);

    // Execute the appropriate command
    match cli.command {
        Commands::Serve => {
            let addr: SocketAddr = config.server.bind_addr.parse()?;
            web_server::run_server(trading_engine, addr).await?;
        }
        Commands::AddSymbol(args) => {
            handle_add_symbol(args, db_repo).await?;
        }
        Commands::OpenAccount(args) => {
            let balance = args.balance.unwrap_or(config.accounts.opening_balance);
            let account = trading_engine
                .open_account(args.user_id, &config.accounts.currency, balance)
                .await?;
            println!(
                "Opened account {} for user {} with balance {}",
                account.id, account.user_id, account.balance
            );
        }
    }

    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A paper-trading exchange backend: cash ledger, position book, and
/// market-calendar gated order execution.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server.
    Serve,
    /// List a new instrument in the symbol catalog (administrative).
    AddSymbol(AddSymbolArgs),
    /// Open the cash account for a registered user (administrative).
    OpenAccount(OpenAccountArgs),
}

#[derive(Parser)]
struct AddSymbolArgs {
    /// The ticker to list (stored upper-case, e.g. "AAPL").
    #[arg(long)]
    ticker: String,

    /// The instrument's display name.
    #[arg(long)]
    name: String,

    /// The static reference price all trades execute at.
    #[arg(long)]
    price: Decimal,

    /// The exchange the instrument nominally trades on.
    #[arg(long, default_value = "")]
    exchange: String,

    /// The instrument's sector classification.
    #[arg(long, default_value = "")]
    sector: String,

    /// Total issued shares (display data only).
    #[arg(long, default_value_t = 0)]
    total_shares: i64,
}

#[derive(Parser)]
struct OpenAccountArgs {
    /// The user identifier issued by the identity provider.
    #[arg(long)]
    user_id: Uuid,

    /// Opening balance; defaults to accounts.opening_balance from config.
    #[arg(long)]
    balance: Option<Decimal>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

/// Inserts a new instrument into the read-only symbol catalog.
async fn handle_add_symbol(args: AddSymbolArgs, db_repo: DbRepository) -> anyhow::Result<()> {
    if args.price <= Decimal::ZERO {
        anyhow::bail!("reference price must be strictly positive");
    }

    let symbol = Symbol {
        id: Uuid::new_v4(),
        ticker: normalize_ticker(&args.ticker),
        name: args.name,
        exchange: args.exchange,
        sector: args.sector,
        currency: "USD".to_string(),
        total_shares: args.total_shares,
        reference_price: args.price,
    };
    let inserted = db_repo.insert_symbol(&symbol).await?;
    println!(
        "Listed {} ({}) at reference price {}",
        inserted.ticker, inserted.name, inserted.reference_price
    );
    Ok(())
}
