use clap::Parser;
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod infrastructure;
mod modules;
mod state;
mod workers;

use config::cli::Cli;
use config::settings::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli);

    // Initialize tracing
    let filter = match &config.log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    config.validate()?;

    info!("Starting {}", env!("CARGO_PKG_NAME"));

    let state = app::create_app(config).await?;

    let shutdown = CancellationToken::new();
    tokio::spawn(app::shutdown_signal(shutdown.clone()));

    workers::indexer::start_indexer_worker(state, shutdown).await
}
