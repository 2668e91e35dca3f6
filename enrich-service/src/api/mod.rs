//! HTTP API handlers

pub mod contacts;
pub mod enrichment;
pub mod health;
pub mod providers;

pub use contacts::{get_contact, get_profile, list_contacts};
pub use enrichment::{get_enrichment, start_enrichment};
pub use health::health_routes;
pub use providers::list_providers;
