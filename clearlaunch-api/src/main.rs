//! # ClearLaunch API Server
//!
//! Serves the ClearLaunch JSON API: launch planning, task management,
//! AI generation, calendar export and subscription billing.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p clearlaunch-api
//! ```

use clearlaunch_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use clearlaunch_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "clearlaunch_api=debug,clearlaunch_shared=debug,tower_http=debug".into()
    });

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    tracing::info!(
        "ClearLaunch API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool).await?;

    if config.llm.api_key.is_none() {
        tracing::warn!("LLM_API_KEY not set, AI generation will fail");
    }
    if config.stripe.secret_key.is_none() {
        tracing::warn!("STRIPE_SECRET_KEY not set, billing is disabled");
    }

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
