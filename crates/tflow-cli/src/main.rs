use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tflow_gateway::GatewayConfig;
use tflow_seed::{ensure_seeded, SeedOutcome};
use tflow_storage::{Store, StoreError};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tflow-cli")]
#[command(about = "TalentFlow mock backend")]
struct Cli {
    /// Store snapshot path; overrides TFLOW_DB_PATH.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Seed if needed, then serve the API until ctrl-c.
    Serve {
        /// Overrides TFLOW_PORT.
        #[arg(long)]
        port: Option<u16>,
        /// Turn off synthetic latency and injected failures.
        #[arg(long)]
        no_faults: bool,
    },
    /// Seed the store unless it already holds data.
    Seed {
        /// Fixed RNG seed for a reproducible dataset.
        #[arg(long)]
        rng_seed: Option<u64>,
    },
    /// Delete every record, including the seeded flag.
    Reset,
    /// Print record counts per table.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = GatewayConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        no_faults: false,
    }) {
        Commands::Serve { port, no_faults } => {
            if let Some(port) = port {
                config.port = port;
            }
            if no_faults {
                config.faults_enabled = false;
            }
            tflow_gateway::serve(config).await?;
        }
        Commands::Seed { rng_seed } => {
            let store = open_store(&config).await?;
            let mut rng = rng_seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
            match ensure_seeded(&store, &mut rng).await? {
                SeedOutcome::Seeded(summary) => println!(
                    "seeded: jobs={} assessments={} candidates={} timeline_events={}",
                    summary.jobs, summary.assessments, summary.candidates, summary.timeline_events
                ),
                SeedOutcome::AlreadySeeded => println!("store already seeded; nothing written"),
            }
            store.close().await?;
        }
        Commands::Reset => {
            let store = open_store(&config).await?;
            store.clear().await?;
            store.close().await?;
            info!(db = %config.db_path.display(), "store reset");
        }
        Commands::Stats => {
            let store = open_store(&config).await?;
            let now = Utc::now();
            let week_ago = now - Duration::days(7);
            let (counts, seeded, recent) = store
                .read(|db| {
                    let recent = db.candidates.where_between(
                        "createdAt",
                        week_ago.timestamp_millis(),
                        now.timestamp_millis() + 1,
                    )?;
                    Ok::<_, StoreError>((db.counts(), db.is_seeded(), recent.len()))
                })
                .await?;
            if let Some(path) = store.path() {
                println!("store: {}", path.display());
            }
            println!("{}", serde_json::to_string_pretty(&counts)?);
            println!("seeded: {seeded}");
            println!("candidates created in the last 7 days: {recent}");
        }
    }

    Ok(())
}

async fn open_store(config: &GatewayConfig) -> Result<Store> {
    Store::open(&config.db_path)
        .await
        .with_context(|| format!("opening store at {}", config.db_path.display()))
}
