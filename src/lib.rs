pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod finance;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod util;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use db::AppState;

/// The full application router. Rate limiting is layered on in `main`,
/// where per-peer connect info exists.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::public::router())
        .merge(handlers::users::router(state.clone()))
        .nest("/admin", handlers::admin::router(state.clone()))
        .nest("/dev", handlers::dev::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
