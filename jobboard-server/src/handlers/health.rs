use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub storage: &'static str,
}

/// Liveness probe. Reports storage reachability without failing the probe.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage = match (&state.database, state.store.is_healthy().await) {
        (None, _) => "in-memory",
        (Some(_), true) => "up",
        (Some(_), false) => "down",
    };

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage,
    })
}
