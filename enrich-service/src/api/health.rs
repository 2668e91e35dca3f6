//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Module name ("enrich-service")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Short commit hash the binary was built from
    pub commit: String,
    pub uptime_seconds: u64,
    /// Enrichments currently being processed
    pub in_flight: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);

    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "enrich-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: env!("ENRICH_COMMIT").to_string(),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
        in_flight: state.service.in_flight(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
