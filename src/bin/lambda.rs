//! AWS Lambda entry point for starfeed
//!
//! Deploy with `cargo lambda build --release --features lambda`.
//! Invoke on a schedule; one invocation runs one full batch cycle.

use lambda_runtime::{Error as LambdaError, service_fn};

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use starfeed::handler::handler;

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starfeed Lambda starting...");
    lambda_runtime::run(service_fn(handler)).await
}
