//! Worker binary
//!
//! Runs one worker per queue channel plus the maintenance scheduler, or a
//! single one-shot command.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use engine_client::EngineClient;
use futures::future::join_all;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use worker_core::domains::{register_all, schedules::advance_schedules};
use worker_core::kernel::jobs::{JobChannel, JobRegistry, JobWorker, JobWorkerConfig, PostgresJobQueue};
use worker_core::kernel::scheduled_tasks::start_scheduler;
use worker_core::kernel::{EngineAdapter, PostgresStore, WorkerDeps};
use worker_core::Config;

#[derive(Parser)]
#[command(name = "worker")]
#[command(about = "Content intelligence job worker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the channel workers and the scheduler until interrupted
    Run,

    /// Apply pending database migrations and exit
    Migrate,

    /// Enqueue every due discovery schedule once and exit
    AdvanceSchedules,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Migrate => migrate(&pool).await,
        Commands::AdvanceSchedules => {
            let deps = build_deps(&config, pool);
            let summary = advance_schedules(&deps)
                .await
                .context("Failed to advance schedules")?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Commands::Run => {
            migrate(&pool).await?;
            run(&config, pool).await
        }
    }
}

async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations applied");
    Ok(())
}

fn build_deps(config: &Config, pool: PgPool) -> WorkerDeps {
    let engine = EngineClient::new(config.engine_api_key.clone()).with_base_url(config.engine_url.clone());

    WorkerDeps::builder()
        .store(Arc::new(PostgresStore::new(pool.clone())))
        .engine(Arc::new(EngineAdapter::new(engine)))
        .queue(Arc::new(PostgresJobQueue::new(pool)))
        .audit_retention_days(config.audit_retention_days)
        .build()
}

async fn run(config: &Config, pool: PgPool) -> Result<()> {
    let deps = Arc::new(build_deps(config, pool));

    let mut registry = JobRegistry::new();
    register_all(&mut registry);
    let registry = Arc::new(registry);

    let shutdown = CancellationToken::new();

    let mut scheduler = if config.scheduler_enabled {
        Some(start_scheduler(deps.queue.clone()).await?)
    } else {
        tracing::info!("Scheduler disabled");
        None
    };

    let channels = [
        (JobChannel::Discovery, config.discovery_concurrency),
        (JobChannel::Analysis, config.analysis_concurrency),
        (JobChannel::Maintenance, config.maintenance_concurrency),
    ];

    let handles: Vec<_> = channels
        .into_iter()
        .map(|(channel, concurrency)| {
            let worker_config = JobWorkerConfig::for_channel(channel, concurrency)
                .with_poll_interval(config.poll_interval);
            let worker = JobWorker::new(registry.clone(), deps.clone(), worker_config);
            let token = shutdown.clone();
            tokio::spawn(async move {
                if let Err(e) = worker.run(token).await {
                    tracing::error!(channel = %worker.channel(), error = %e, "Worker stopped with error");
                }
            })
        })
        .collect();

    tracing::info!("Workers started");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown requested");
    shutdown.cancel();

    join_all(handles).await;

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }

    tracing::info!("Worker shut down");
    Ok(())
}
