//! HTTP surface: configuration, routes, and middleware assembly.

pub mod config;
mod routes;

pub use config::{Config, Secrets};
pub use routes::{router, AppState};

use std::time::Duration;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the full application: routes plus CORS, tracing, and the
/// request timeout from the config's limits section.
pub fn app(state: AppState, limits: &config::LimitsConfig) -> Router {
    router(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            limits.request_timeout_secs,
        )))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
