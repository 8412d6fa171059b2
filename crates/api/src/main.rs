//! Taskping API server binary entrypoint.

use std::net::SocketAddr;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use taskping_common::config::AppConfig;
use taskping_engine::context::ServiceContext;

use taskping_api::routes::create_router;
use taskping_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("taskping_api=debug,taskping_engine=debug,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting Taskping API server...");

    let config = AppConfig::from_env()?;
    let port = config.api_port;

    let context = ServiceContext::from_config(config).await?;
    tracing::info!(
        claims = context.claims.is_some(),
        strategy = ?context.config.scan.strategy,
        "Service context ready"
    );

    let app = create_router(AppState::new(context))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Received shutdown signal, stopping gracefully...");
        })
        .await?;

    Ok(())
}
