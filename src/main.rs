// Service entry point
// Reads the environment, wires the CMS catalog into the router and serves it

use anyhow::Context;
use std::sync::Arc;
use taxi_booking::server::SESSION_SWEEP_INTERVAL;
use taxi_booking::{router, AppConfig, AppState, CmsCatalogProvider, LogFormat};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);

    let provider = CmsCatalogProvider::new(config.catalog.clone())
        .context("failed to build the CMS catalog client")?;
    if provider.config().site_id.is_none() || provider.config().api_token.is_none() {
        info!("CMS credentials not set, the fallback catalog will be served");
    }
    let state = AppState::new(Arc::new(provider)).with_max_idle(config.session_idle);
    state.spawn_session_sweeper(SESSION_SWEEP_INTERVAL);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "Taxi booking service listening");

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(log_format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taxi_booking=debug,tower_http=debug".into());

    match log_format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}
