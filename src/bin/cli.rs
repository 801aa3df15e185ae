//! starfeed CLI
//!
//! Local execution entry point. For AWS Lambda, use `starfeed-lambda`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use starfeed::{
    error::Result,
    models::{Config, TelegramConfig},
    pipeline,
    storage::{ResourceStore, SqliteStore},
    telegram::TelegramClient,
    utils::http,
};

/// starfeed - gallery-to-Telegram batch notifier
#[derive(Parser, Debug)]
#[command(
    name = "starfeed",
    version,
    about = "Polls the resource gallery and forwards new entries to Telegram"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "starfeed.toml")]
    config: PathBuf,

    /// Path to the SQLite database
    #[arg(short, long, default_value = "resources.db")]
    database: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one full ingest-then-notify cycle
    Run,

    /// Fetch the gallery and persist new resources without notifying
    Ingest,

    /// Deliver stored-but-unsent resources
    Notify,

    /// Validate configuration and credentials
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Build everything a pipeline command needs.
async fn setup(
    config: &Config,
    database: &PathBuf,
) -> Result<(TelegramConfig, SqliteStore, reqwest::Client, TelegramClient)> {
    let telegram = TelegramConfig::from_env()?;
    let store = SqliteStore::open(database).await?;
    let client = http::create_async_client(&config.crawler)?;
    let channel = TelegramClient::new(client.clone(), &telegram);
    Ok((telegram, store, client, channel))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("starfeed starting...");

    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    match cli.command {
        Command::Run => {
            let (telegram, store, client, channel) = setup(&config, &cli.database).await?;
            let outcome =
                pipeline::run_batch(&config, &telegram, &store, &channel, &client).await?;
            log::info!(
                "Batch complete: {} new resources, {} delivered",
                outcome.ingest.new_records,
                outcome.sent
            );
        }

        Command::Ingest => {
            let (_telegram, store, client, _channel) = setup(&config, &cli.database).await?;
            let mut known = store.list_identifiers().await?.into_iter().collect();
            let result = pipeline::run_ingest(&mut known, &store, &client, &config).await;
            store.close().await;

            let outcome = result?;
            log::info!(
                "Ingest complete: {} pages, {} new, {} known skipped",
                outcome.pages_fetched,
                outcome.new_records,
                outcome.known_skipped
            );
        }

        Command::Notify => {
            let (telegram, store, _client, channel) = setup(&config, &cli.database).await?;
            let result = pipeline::deliver_unsent(&store, &channel, &config, &telegram).await;
            store.close().await;

            let sent = result?;
            log::info!("Delivered {sent} resources");
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            log::info!("✓ Config OK (gallery, sources, and shapes)");

            TelegramConfig::from_env()?;
            log::info!("✓ Telegram credentials present");

            log::info!("All validations passed!");
        }
    }

    log::info!("Done!");

    Ok(())
}
