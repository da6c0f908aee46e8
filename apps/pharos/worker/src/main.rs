//! Pharos Worker
//!
//! Background jobs for the events recommendation engine. Runs the tag vector
//! scheduler and the compensation loop as a long-lived service, or executes
//! single passes from the command line.

use clap::{Parser, Subcommand};
use core_config::Environment;
use core_config::tracing::{init_tracing, install_color_eyre};
use eyre::Result;
use tracing::info;

mod config;
mod runner;

use config::Config;
use runner::JobRunner;

#[derive(Parser)]
#[command(name = "pharos-worker")]
#[command(about = "Run background jobs for the events recommendation engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler and the compensation loop until interrupted
    Run {
        /// Cron expression for the tag vector refresh (default: every 30 minutes)
        #[arg(short, long, default_value = "0 */30 * * * *")]
        cron: String,
    },

    /// Run a single tag vector refresh pass
    Tags,

    /// Drain one batch of pending compensation actions
    Compensate,

    /// Show queue depth and failed compensation actions
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    let environment = Environment::from_env();
    init_tracing(&environment);

    // Initialize metrics
    observability::init_metrics();

    let cli = Cli::parse();

    // Connect to the stores concurrently
    let postgres_future = async {
        database::postgres::connect_from_config_with_retry(config.database.clone(), None)
            .await
            .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))
    };
    let redis_future = async {
        database::redis::connect_from_config_with_retry(config.redis.clone(), None)
            .await
            .map_err(|e| eyre::eyre!("Redis connection failed: {}", e))
    };
    let (db, redis) = tokio::try_join!(postgres_future, redis_future)?;

    let runner = JobRunner::new(db, redis)?;

    match cli.command {
        Commands::Run { cron } => {
            info!("Starting background jobs");
            runner.run(&cron).await?;
            info!("Background jobs stopped");
        }

        Commands::Tags => {
            let updated = runner.refresh_tags().await?;
            info!(updated, "Tag vector refresh complete");
        }

        Commands::Compensate => {
            let processed = runner.drain_compensation().await?;
            info!(processed, "Compensation drain complete");
        }

        Commands::Status => {
            let status = runner.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}
