use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use moodtrack_core::config::Configuration;
use moodtrack_core::{env_duration_secs, GRAPH_OUTPUT_DIR, TEMP_RECORD_TTL_SECS};
use moodtrack_graph::SvgRenderer;
use moodtrack_service::{
    backfill_neutral_records, ConversationService, Dispatcher, GraphingService, JobQueue,
    Notifier, SessionManager, Transport, UserService,
};
use moodtrack_storage::StorageBackend;
use moodtrack_telegram::{BotClient, UpdatePoller};
use tracing_subscriber::EnvFilter;

mod dispatch;

#[derive(Parser)]
#[command(name = "moodtrack")]
#[command(about = "Telegram bot for daily metric check-ins", long_about = None)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot until interrupted.
    Run,
    /// Validate the configuration and print the expanded metric set.
    CheckConfig,
    /// Insert one neutral record per day in a date range (maintenance).
    Backfill {
        user_id: i64,
        /// First day, inclusive (YYYY-MM-DD).
        from: NaiveDate,
        /// Last day, inclusive (YYYY-MM-DD).
        to: NaiveDate,
    },
}

fn bot_token() -> Result<String> {
    std::env::var("TELEGRAM_TOKEN")
        .map_err(|_| anyhow::anyhow!("TELEGRAM_TOKEN environment variable must be set"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = Configuration::load(&cli.config)?;

    match cli.command {
        Commands::Run => run(config).await?,
        Commands::CheckConfig => check_config(&config),
        Commands::Backfill { user_id, from, to } => {
            let storage = StorageBackend::from_config(config.database()).await?;
            let defaults: BTreeMap<String, i64> = config
                .metrics()
                .iter()
                .map(|m| (m.name.clone(), m.baseline.unwrap_or(0)))
                .collect();
            let count =
                backfill_neutral_records(&storage, user_id, &defaults, from, to).await?;
            println!("inserted {count} neutral records for user {user_id}");
        },
    }
    Ok(())
}

fn check_config(config: &Configuration) {
    for metric in config.metrics() {
        let baseline = metric
            .baseline
            .map_or_else(String::new, |b| format!(", baseline {b}"));
        println!("{}: {} values{baseline}", metric.name, metric.values.len());
    }
    println!(
        "{} notification(s), auto-baseline {}",
        config.notifications().len(),
        if config.auto_baseline().enabled() { "enabled" } else { "disabled" },
    );
    println!("configuration OK");
}

/// Composition root: wire the storage backend, services, and transport
/// once, re-register scheduled jobs, then drive the update loop.
async fn run(config: Configuration) -> Result<()> {
    let bot = BotClient::new(&bot_token()?)?;
    let transport: Arc<dyn Transport> = Arc::new(bot.clone());

    let storage = Arc::new(StorageBackend::from_config(config.database()).await?);
    let config = Arc::new(config);

    let ttl = env_duration_secs("MOODTRACK_TTL_SECS", TEMP_RECORD_TTL_SECS);
    let sessions = Arc::new(SessionManager::with_ttls(ttl, ttl));

    let job_queue = Arc::new(JobQueue::new());
    let notifier = Arc::new(Notifier::new(
        Arc::clone(&job_queue),
        Arc::clone(&transport),
        Arc::clone(&storage),
    ));
    let users = Arc::new(UserService::new(
        Arc::clone(&storage),
        notifier,
        Arc::clone(&config),
    ));
    let conversation = Arc::new(ConversationService::new(
        Arc::clone(&storage),
        Arc::clone(&transport),
        Arc::clone(&sessions),
    ));
    let graphing = Arc::new(GraphingService::new(
        Arc::clone(&storage),
        Arc::clone(&transport),
        Arc::clone(&sessions),
        Arc::new(SvgRenderer),
        PathBuf::from(GRAPH_OUTPUT_DIR),
    ));
    let dispatcher = Dispatcher::new(
        Arc::clone(&sessions),
        Arc::clone(&conversation),
        Arc::clone(&graphing),
        Arc::clone(&transport),
    );

    users.schedule_all().await?;
    tracing::info!(jobs = job_queue.job_count(), "startup scheduling complete");

    let handlers = dispatch::Handlers {
        users,
        conversation,
        graphing,
        dispatcher,
        transport,
        config,
    };

    let mut poller = UpdatePoller::new(bot);
    tracing::info!("moodtrack is running");
    loop {
        match poller.next_events().await {
            Ok(events) => {
                for event in events {
                    dispatch::handle_event(&handlers, event).await;
                }
            },
            Err(error) => {
                tracing::error!(%error, "update polling failed, backing off");
                tokio::time::sleep(Duration::from_secs(5)).await;
            },
        }
    }
}
