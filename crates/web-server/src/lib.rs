//! # Bourse Web Server
//!
//! The HTTP surface over the trading engine. Deliberately thin: routing,
//! identity extraction from gateway headers, JSON (de)serialization, and
//! error mapping all live here; every business rule lives in `engine`.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use engine::ExecutionEngine;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;
pub mod identity;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub engine: ExecutionEngine,
}

/// Builds the application router. Separated from [`run_server`] so tests
/// and alternative entry points can mount the same routes.
pub fn build_router(engine: ExecutionEngine) -> Router {
    let app_state = Arc::new(AppState { engine });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        // --- Orders ---
        .route("/api/orders", post(handlers::place_order))
        .route("/api/orders", get(handlers::get_order_history))
        .route("/api/orders/:order_id", delete(handlers::cancel_order))
        // --- Accounts (cash management) ---
        .route("/api/accounts/deposit", post(handlers::deposit))
        .route("/api/accounts/withdraw", post(handlers::withdraw))
        .route("/api/accounts/balance", get(handlers::get_balance))
        .route("/api/accounts/transactions", get(handlers::get_transaction_history))
        .route("/api/portfolio", get(handlers::get_portfolio))
        // --- Market (read-only asset catalog) ---
        .route("/api/market/assets", get(handlers::list_assets))
        .route("/api/market/assets/:ticker", get(handlers::get_asset))
        // --- Market calendar ---
        .route("/api/market/open", get(handlers::is_market_open))
        .route("/api/market/schedule", get(handlers::get_schedule))
        .route("/api/market/schedule", put(handlers::update_schedule))
        .route("/api/market/holidays", get(handlers::get_holidays))
        .route("/api/market/holidays", post(handlers::add_holiday))
        .route("/api/market/holidays/:date", delete(handlers::delete_holiday))
        .route("/api/market/holidays", delete(handlers::delete_all_holidays))
        .with_state(app_state)
        .layer(cors)
        // This middleware will automatically log information about every
        // incoming request.
        .layer(TraceLayer::new_for_http())
}

/// The main function to configure and run the web server.
pub async fn run_server(engine: ExecutionEngine, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(engine);

    tracing::info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
