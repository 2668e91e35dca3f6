//! enrich-service library
//!
//! Simulated multi-provider contact enrichment: a durable store of
//! enrichment records, a background worker that searches providers for each
//! requested attribute, and the HTTP API in front of them.

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub mod api;
pub mod db;
pub mod directory;
pub mod error;
pub mod models;
pub mod service;
pub mod worker;

pub use service::EnrichmentService;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EnrichmentService>,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: Arc<EnrichmentService>) -> Self {
        Self {
            service,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::http::{header, Method};
    use axum::routing::{get, post};
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/contacts", get(api::list_contacts))
        .route("/contact/:id", get(api::get_contact))
        .route("/thirdparty/:full_name", get(api::get_profile))
        .route("/providers", get(api::list_providers))
        .route("/enrichment/start", post(api::start_enrichment))
        .route("/enrichment/:id", get(api::get_enrichment))
        .merge(api::health_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
