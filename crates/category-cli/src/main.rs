//! # categoryctl
//!
//! Binary entry point for the category store command line.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use category_cli::{Cli, Config, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    cli.apply_overrides(&mut config);

    init_tracing(&config);

    tracing::info!(version = category_cli::VERSION, "Starting categoryctl");
    tracing::info!(
        url = %config.redis.url,
        prefix = %config.redis.key_prefix,
        "Connecting to Redis"
    );

    let store = category_persistence::connect_redis(config.redis.clone()).await?;
    tracing::debug!("Redis connected");

    let output = category_cli::execute(&store, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Logs go to stderr so stdout carries only command output
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_level.clone().into());
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
