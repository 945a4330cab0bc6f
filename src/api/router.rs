use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Ingest (balance-reading collaborator)
        .route("/api/snapshots", post(handlers::snapshots::record))
        .route("/api/snapshots/batch", post(handlers::snapshots::batch))
        // Wallet queries
        .route("/api/wallets/:wallet/stats", get(handlers::wallets::stats))
        .route("/api/wallets/:wallet/snapshots", get(handlers::wallets::snapshots))
        .route("/api/wallets/:wallet/sessions", get(handlers::wallets::sessions))
        .route("/api/wallets/:wallet/rewards", get(handlers::wallets::rewards))
        .route("/api/wallets/:wallet/eligibility", get(handlers::wallets::eligibility))
        .route("/api/wallets/:wallet/claim", post(handlers::wallets::claim))
        // Config (admin appends; history is immutable)
        .route(
            "/api/config",
            get(handlers::config::get_config).post(handlers::config::append_config),
        );

    let ops = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    ops.merge(api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
