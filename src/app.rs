use crate::config::settings::AppConfig;
use crate::infrastructure::redis::client::RedisService;
use crate::state::AppState;
use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub async fn create_app(config: AppConfig) -> anyhow::Result<AppState> {
    let redis = RedisService::new(
        &config.redis_url,
        config.redis_max_idle,
        config.redis_idle_timeout,
    )
    .context("invalid Redis URL")?;
    redis.check().await.context("Error creating redis connection")?;

    Ok(AppState::new(config, redis))
}

/// Cancels `shutdown` on Ctrl-C or SIGTERM. A job already running is
/// finished first; the worker only looks at the token between jobs.
pub async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Captured interrupt. Exiting..."),
        _ = terminate => info!("Captured terminate. Exiting..."),
    }

    shutdown.cancel();
}
