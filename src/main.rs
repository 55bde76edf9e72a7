//! Entry point: parse CLI and dispatch to command handlers.

use anyhow::Context;
use clap::Parser;
use sleeper_sync::{
    cli::{Commands, SleeperSync},
    commands::{
        plan::handle_plan,
        status::handle_status,
        sync::{handle_sync, SyncParams},
    },
    config, logging,
};
use tokio::sync::watch;
use tracing::warn;

/// Run the CLI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    logging::init();
    let app = SleeperSync::parse();

    match app.command {
        Commands::Sync {
            jobs,
            username,
            database,
            concurrency,
            base_url,
            timeout_secs,
            max_attempts,
            dry_run,
        } => {
            let (cancel_tx, cancel_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupt received, cancelling run");
                    let _ = cancel_tx.send(true);
                }
            });

            let report = handle_sync(
                SyncParams {
                    jobs,
                    username,
                    database,
                    concurrency,
                    base_url,
                    timeout_secs,
                    max_attempts,
                    dry_run,
                },
                cancel_rx,
            )
            .await
            .context("sync failed")?;

            if !report.succeeded() {
                std::process::exit(1);
            }
        }

        Commands::Plan { jobs } => handle_plan(jobs).context("could not build the job plan")?,

        Commands::Status { database } => {
            handle_status(database).context("could not read the store")?
        }
    }

    Ok(())
}
