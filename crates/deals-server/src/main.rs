//! Board-game deal aggregator HTTP server
//!
//! Axum-based server exposing the single-shot search endpoint and the
//! incremental SSE search stream over every configured marketplace.

mod config;
mod handlers;
mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deals_core::DealFinder;
use deals_sources::{build_services, exchange_service};

use crate::config::AppConfig;
use crate::handlers::{health_check, search_handler, stream_search_handler};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();

    // One connection pool shared by every marketplace client; per-search
    // deadlines are enforced separately by the orchestrator.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let converter = Arc::new(exchange_service(http.clone()));
    let services = build_services(&http, &config.sources, &converter);
    let finder = Arc::new(DealFinder::new(services));

    tracing::info!("Registered {} sources:", finder.sources().len());
    for source in finder.sources() {
        tracing::info!("  • {}", source);
    }

    let state = AppState { finder };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/search", get(search_handler))
        .route("/api/v1/stream-search", get(stream_search_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("deal aggregator listening on http://{}", config.bind_addr);
    tracing::info!("  GET /health                 - Health check");
    tracing::info!("  GET /api/v1/search          - Merged price-sorted search");
    tracing::info!("  GET /api/v1/stream-search   - Incremental SSE search");

    axum::serve(listener, app).await?;

    Ok(())
}
