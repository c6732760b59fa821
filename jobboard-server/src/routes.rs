use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};

use crate::auth::{optional_auth, require_admin, require_auth};
use crate::handlers::{admin, auth, health, users};
use crate::server::AppState;

/// Create health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health::health_check))
}

/// Create session routes
pub fn auth_routes(state: &AppState) -> Router<AppState> {
    let register = Router::new()
        .route("/register", post(auth::register))
        .route_layer(from_fn_with_state(state.clone(), optional_auth));

    Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .merge(register)
}

/// Create routes for the signed-in user
pub fn user_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(users::get_me).patch(users::update_me))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
}

/// Create admin routes
pub fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/users/:id/role", patch(admin::change_user_role))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
}

/// Create all API routes
pub fn create_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .merge(user_routes(state))
        .nest("/auth", auth_routes(state))
        .nest("/admin", admin_routes(state))
}
