use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::require_auth;
use super::handlers;
use crate::AppState;

/// Read-only reporting API. Managed wallets are never exposed.
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::metrics));

    let protected = Router::new()
        .route("/api/trades", get(handlers::trades::list))
        .route("/api/trades/:id", get(handlers::trades::detail))
        .route("/api/addresses", get(handlers::addresses::list))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
