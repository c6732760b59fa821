//! Job board server
//!
//! HTTP surface of the authentication core: registration, login, refresh
//! token rotation, logout, the current user's profile and admin role
//! changes. The authorization gate (`auth::require_auth` and friends) and the
//! ownership gates are exported for the business routes mounted next to
//! these.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use crate::config::AppConfig;
pub use crate::error::ApiError;
pub use crate::server::AppState;

use axum::{middleware::from_fn, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the main application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = middleware::create_cors_layer(&state.cors_origins);

    routes::create_routes(&state)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(middleware::request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(middleware::make_request_span))
                .layer(cors)
                .layer(from_fn(middleware::request_timing_middleware)),
        )
        .with_state(state)
}
