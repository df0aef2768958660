//! # stockbook-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the Stockbook API.
//! Binds to configurable port (default 8080).

use stockbook_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Build configuration from environment.
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let bcrypt_cost: u32 = std::env::var("STOCKBOOK_BCRYPT_COST")
        .ok()
        .and_then(|c| c.parse().ok())
        .unwrap_or(bcrypt::DEFAULT_COST);

    let config = AppConfig { port, bcrypt_cost };

    // Initialize database pool (optional — absent means in-memory only).
    let db_pool = stockbook_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;

    let state = AppState::with_config(config, db_pool);

    // Hydrate in-memory stores from database (if connected).
    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("Database hydration failed: {e}");
        e
    })?;

    let app = stockbook_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Stockbook API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
