use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use core_types::{Record, TradingStats};
use database::{DateRange, DbRepository};
use std::net::SocketAddr;

/// The main entry point for the Panoptico dashboard backend.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if there is one.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let settings = configuration::load_settings().context("Failed to load configuration")?;
    let _log_guard = configuration::init_logging(&settings.logging);

    let executor = database::connect(&settings.database)
        .await
        .context("Failed to connect to the database")?;
    let db_repo = DbRepository::new(executor);
    tracing::debug!("Database executor ready.");

    match cli.command {
        Commands::Serve(args) => {
            let addr = match args.addr {
                Some(addr) => addr,
                None => settings.server.socket_addr()?,
            };
            web_server::run_server(addr, db_repo).await
        }
        Commands::Summary => handle_summary(&db_repo).await,
        Commands::Stats => {
            let stats = db_repo.get_trading_stats().await?;
            println!("{}", stats_table(&stats));
            Ok(())
        }
        Commands::Health => handle_health(&db_repo).await,
        Commands::Timeline(args) => handle_timeline(args, &db_repo).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Read-only views over the trading bot's telemetry database.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard JSON API.
    Serve(ServeArgs),
    /// Print the dashboard summary: latest portfolio, stats, open positions and recent trades.
    Summary,
    /// Print aggregate trading statistics.
    Stats,
    /// Check that the database answers.
    Health,
    /// Print news, analyses and trades for a date range.
    Timeline(TimelineArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Address to bind, overriding `server.host` / `server.port` (e.g., "127.0.0.1:8080").
    #[arg(long)]
    addr: Option<SocketAddr>,
}

#[derive(Parser)]
struct TimelineArgs {
    /// The first day to include (format: YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// The last day to include (format: YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Maximum rows per category.
    #[arg(long)]
    limit: Option<i64>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_summary(db_repo: &DbRepository) -> anyhow::Result<()> {
    let summary = db_repo.get_dashboard_summary().await?;

    println!("Latest portfolio snapshot");
    match &summary.portfolio {
        Some(snapshot) => println!("{}", records_table(std::slice::from_ref(snapshot))),
        None => println!("No portfolio snapshot recorded yet."),
    }

    println!("\nTrading statistics");
    println!("{}", stats_table(&summary.stats));

    println!("\nOpen positions ({})", summary.open_positions.len());
    print_records(&summary.open_positions);

    println!("\nRecent trades");
    print_records(&summary.recent_trades);

    Ok(())
}

async fn handle_health(db_repo: &DbRepository) -> anyhow::Result<()> {
    let report = db_repo.health_check().await;
    if report.is_healthy() {
        println!("healthy: database {}", report.database.as_deref().unwrap_or("connected"));
        Ok(())
    } else {
        anyhow::bail!(
            "unhealthy: {}",
            report.error.as_deref().unwrap_or("unknown error")
        )
    }
}

async fn handle_timeline(args: TimelineArgs, db_repo: &DbRepository) -> anyhow::Result<()> {
    let range = DateRange::new(args.from, args.to);
    let timeline = db_repo.get_timeline_data(&range, args.limit).await?;

    for (title, records) in [
        ("News", &timeline.news),
        ("Analyses", &timeline.analyses),
        ("Trades", &timeline.trades),
    ] {
        println!("\n{} ({})", title, records.len());
        print_records(records);
    }

    Ok(())
}

// ==============================================================================
// Table Rendering
// ==============================================================================

fn print_records(records: &[Record]) {
    if records.is_empty() {
        println!("(none)");
    } else {
        println!("{}", records_table(records));
    }
}

/// One row per record, headed by the first record's columns.
fn records_table(records: &[Record]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let Some(first) = records.first() else {
        return table;
    };
    let columns: Vec<&str> = first.columns().collect();
    table.set_header(
        columns
            .iter()
            .map(|c| Cell::new(c).add_attribute(Attribute::Bold)),
    );

    for record in records {
        table.add_row(columns.iter().map(|c| {
            record
                .get(c)
                .map(|v| Cell::new(v.to_string()))
                .unwrap_or_else(|| Cell::new(""))
        }));
    }
    table
}

fn stats_table(stats: &TradingStats) -> Table {
    let pnl_color = if stats.total_pnl >= 0.0 {
        Color::Green
    } else {
        Color::Red
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ])
        .add_row(vec![Cell::new("Total trades"), Cell::new(stats.total_trades)])
        .add_row(vec![Cell::new("Buys"), Cell::new(stats.buy_count)])
        .add_row(vec![Cell::new("Sells"), Cell::new(stats.sell_count)])
        .add_row(vec![
            Cell::new("Total P&L"),
            Cell::new(format!("{:.2}", stats.total_pnl)).fg(pnl_color),
        ])
        .add_row(vec![
            Cell::new("Avg P&L %"),
            Cell::new(format!("{:.2}%", stats.avg_pnl_percent)),
        ])
        .add_row(vec![Cell::new("Wins"), Cell::new(stats.wins)])
        .add_row(vec![Cell::new("Losses"), Cell::new(stats.losses)])
        .add_row(vec![
            Cell::new("Win rate"),
            Cell::new(format!("{:.1}%", stats.win_rate)),
        ]);
    table
}
