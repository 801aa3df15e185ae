// src/handler.rs

//! AWS Lambda handler for the batch job.

use std::path::Path;

use lambda_runtime::{Error as LambdaError, LambdaEvent};

use serde_json::Value;
use tracing::{error, info};

use crate::error::Result;
use crate::models::{Config, TelegramConfig};
use crate::pipeline::{BatchOutcome, run_batch};
use crate::storage::SqliteStore;
use crate::telegram::TelegramClient;
use crate::utils::http;

/// Main Lambda handler function.
pub async fn handler(event: LambdaEvent<Value>) -> std::result::Result<Value, LambdaError> {
    info!("Handling event: {:?}", event.payload);

    match run_lambda_batch().await {
        Ok(outcome) => {
            info!(
                "Lambda execution successful: {} new, {} delivered",
                outcome.ingest.new_records, outcome.sent
            );
            Ok(serde_json::json!({
                "status": "success",
                "new_resources": outcome.ingest.new_records,
                "delivered": outcome.sent,
            }))
        }
        Err(e) => {
            error!("Lambda execution failed: {}", e);
            Ok(serde_json::json!({ "status": "error", "message": e.to_string() }))
        }
    }
}

/// Internal batch logic for the Lambda environment.
async fn run_lambda_batch() -> Result<BatchOutcome> {
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "starfeed.toml".to_string());
    let config = Config::load_or_default(&config_path);
    config.validate()?;

    let telegram = TelegramConfig::from_env()?;

    let db_path =
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| "/tmp/resources.db".to_string());
    let store = SqliteStore::open(Path::new(&db_path)).await?;

    let client = http::create_async_client(&config.crawler)?;
    let channel = TelegramClient::new(client.clone(), &telegram);

    run_batch(&config, &telegram, &store, &channel, &client).await
}
