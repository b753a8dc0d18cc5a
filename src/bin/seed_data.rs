//! Runs one seeding pass against the configured database, without the HTTP server.
//!
//! Run with: cargo run --bin seed-data -- --months 12 --seed 42

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use validator::Validate;

use fleet_seeder::config::{init_tracing, load_config};
use fleet_seeder::db::{close_pool, establish_connection_from_app_config};
use fleet_seeder::seeding::{SeedPlan, SeedingOrchestrator};

#[derive(Parser)]
#[command(
    name = "seed-data",
    about = "Reset and seed the fleet store with synthetic data",
    version
)]
struct Cli {
    #[arg(
        long,
        env = "DATABASE_URL",
        help = "Database URL; overrides the configured db_* settings"
    )]
    database_url: Option<String>,

    #[arg(long, help = "Number of trucks")]
    trucks: Option<u64>,

    #[arg(long, help = "Number of drivers")]
    drivers: Option<u64>,

    #[arg(long, help = "Number of trailers")]
    trailers: Option<u64>,

    #[arg(long, help = "Number of companies")]
    companies: Option<usize>,

    #[arg(long, help = "Number of terminals")]
    terminals: Option<usize>,

    #[arg(long, help = "First month of load history (YYYY-MM)")]
    start_month: Option<String>,

    #[arg(long, help = "Months of load history")]
    months: Option<u32>,

    #[arg(long, help = "RNG seed for a reproducible run")]
    seed: Option<u64>,

    #[arg(long, help = "Rows per INSERT statement")]
    batch_size: Option<usize>,

    #[arg(long, help = "Print the summary as JSON")]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Assign terminals to existing rows that have none
    Backfill,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut cfg = load_config().context("loading configuration")?;
    init_tracing(cfg.log_level(), cfg.log_json);

    if cli.database_url.is_some() {
        cfg.database_url = cli.database_url.clone();
    }
    let seed = &mut cfg.seed;
    if let Some(v) = cli.trucks {
        seed.trucks = v;
    }
    if let Some(v) = cli.drivers {
        seed.drivers = v;
    }
    if let Some(v) = cli.trailers {
        seed.trailers = v;
    }
    if let Some(v) = cli.companies {
        seed.companies = v;
    }
    if let Some(v) = cli.terminals {
        seed.terminals = v;
    }
    if let Some(v) = cli.start_month.clone() {
        seed.start_month = v;
    }
    if let Some(v) = cli.months {
        seed.months = v;
    }
    if let Some(v) = cli.batch_size {
        seed.batch_size = v;
    }
    if cli.seed.is_some() {
        seed.rng_seed = cli.seed;
    }

    cfg.validate().context("validating seed settings")?;
    let plan = SeedPlan::try_from(&cfg.seed)?;
    let db = establish_connection_from_app_config(&cfg).await?;
    let orchestrator = SeedingOrchestrator::new();

    match cli.command {
        Some(Command::Backfill) => {
            let report = orchestrator.backfill(&db).await?;
            info!(rows = report.total(), "Backfill finished");
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        None => {
            let outcome = orchestrator
                .run(&db, &plan, Utc::now())
                .await
                .map_err(|e| anyhow::anyhow!(e.diagnostic_chain()))?;
            let s = &outcome.summary;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                info!("=== Seed complete (run {}, seed {}) ===", outcome.run_id, outcome.rng_seed);
                info!("  companies:   {}", s.companies);
                info!("  divisions:   {}", s.divisions);
                info!("  departments: {}", s.departments);
                info!("  terminals:   {}", s.terminals);
                info!("  trucks:      {}", s.trucks);
                info!("  drivers:     {}", s.drivers);
                info!("  trailers:    {}", s.trailers);
                info!("  loads:       {} ({} .. {})", s.loads, s.timespan.start, s.timespan.end);
                info!("  open loads downgraded: {}", s.distributions.open_loads_downgraded);
            }
        }
    }

    close_pool(db).await?;
    Ok(())
}
