//! Operator CLI for the Curator archive engine

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use curator_core::ingest::IngestOptions;
use curator_core::queue::{queues, spawn_all};
use curator_core::services::{BagitService, Services};
use curator_core::{AppConfig, CancelToken, CopyStrategy, IngestEngine, Library};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "curator", about = "Local-first archival ingest engine", version)]
struct Cli {
    /// Archive root directory
    #[arg(long, env = "CURATOR_ARCHIVE", global = true)]
    archive: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest files or directories into a location
    Import {
        /// Location short id (e.g. ABC123)
        location: String,
        /// Source files or directories
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        /// Force a placement strategy
        #[arg(long, value_parser = parse_strategy)]
        strategy: Option<CopyStrategy>,
        /// Remove source files after a validated copy
        #[arg(long)]
        delete_originals: bool,
    },
    /// Resume an interrupted session
    Resume { session_id: String },
    /// List resumable sessions
    Sessions,
    /// Show queue depths and dead-letter backlog
    Queue {
        /// Retry a dead-letter entry by id
        #[arg(long)]
        retry: Option<i32>,
        /// Acknowledge a dead-letter entry by id
        #[arg(long)]
        ack: Option<i32>,
    },
    /// Validate a location's bag
    Bag {
        location: String,
        /// Payload-Oxum check only
        #[arg(long)]
        quick: bool,
    },
    /// Run queue workers until interrupted
    Worker {
        /// Workers per queue; defaults to the configured worker count
        #[arg(long)]
        per_queue: Option<usize>,
    },
}

fn parse_strategy(s: &str) -> Result<CopyStrategy, String> {
    CopyStrategy::parse(s).ok_or_else(|| format!("unknown strategy {s:?}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let archive_root = match cli.archive {
        Some(root) => root,
        None => curator_core::config::default_archive_root()
            .map_err(|e| anyhow!("no archive root; pass --archive ({e})"))?,
    };

    let config = AppConfig::load_or_create(&archive_root)?;
    let library = Arc::new(Library::open(config).await?);

    match cli.command {
        Command::Import {
            location,
            sources,
            strategy,
            delete_originals,
        } => {
            let location = library
                .get_location_by_short_id(&location)
                .await?
                .ok_or_else(|| anyhow!("no location with short id {location}"))?;
            let engine = IngestEngine::new(library);
            let on_progress: curator_core::ingest::ProgressFn = Arc::new(|update| {
                info!("[{:?}] {:.1}%", update.stage, update.overall_percent);
            });
            let options = IngestOptions {
                force_strategy: strategy,
                delete_originals,
                on_progress: Some(on_progress),
                ..Default::default()
            };
            let report = engine.import(sources, location.id, options).await?;
            println!(
                "session {}: {} copied, {} duplicates, {} errors",
                report.session_id, report.files_copied, report.duplicates, report.errors
            );
        }

        Command::Resume { session_id } => {
            let engine = IngestEngine::new(library);
            let report = engine.resume(&session_id, IngestOptions::default()).await?;
            println!(
                "session {}: {} copied, {} duplicates, {} errors",
                report.session_id, report.files_copied, report.duplicates, report.errors
            );
        }

        Command::Sessions => {
            let sessions = library.list_resumable().await?;
            if sessions.is_empty() {
                println!("no resumable sessions");
            }
            for session in sessions {
                println!(
                    "{}  step {}/5  {}  {}",
                    session.id, session.last_step, session.status, session.started_at
                );
            }
        }

        Command::Queue { retry, ack } => {
            let queue = library.queue();
            if let Some(dlq_id) = retry {
                let new_id = queue.retry_dead(dlq_id).await?;
                println!("retried as {new_id}");
                return Ok(());
            }
            if let Some(dlq_id) = ack {
                queue.acknowledge_dead(dlq_id).await?;
                println!("acknowledged {dlq_id}");
                return Ok(());
            }
            for &name in queues::ALL {
                let stats = queue.stats(name).await?;
                println!(
                    "{name:16} pending {:4}  processing {:2}  completed {:5}  dead {:3}",
                    stats.pending, stats.processing, stats.completed, stats.dead
                );
            }
            for entry in queue.list_dead(false).await? {
                println!(
                    "DLQ #{}  {}  job {}  attempts {}  {}",
                    entry.id, entry.queue, entry.job_id, entry.attempts, entry.error
                );
            }
        }

        Command::Bag { location, quick } => {
            let location = library
                .get_location_by_short_id(&location)
                .await?
                .ok_or_else(|| anyhow!("no location with short id {location}"))?;
            let outcome = if quick {
                BagitService::quick_validate(&library, &location).await?
            } else {
                BagitService::validate(&library, &location).await?
            };
            println!("bag status: {:?}", outcome.status);
            for error in &outcome.errors {
                println!("  {error}");
            }
        }

        Command::Worker { per_queue } => {
            let per_queue = per_queue.unwrap_or(library.config().worker_count);
            let cancel = CancelToken::new();
            let services = Arc::new(Services::new(library));
            let handles = spawn_all(services, cancel.clone(), per_queue);
            info!("{} workers running; ctrl-c to stop", handles.len());

            tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
            cancel.cancel();
            for handle in handles {
                let _ = handle.await;
            }
        }
    }

    Ok(())
}
