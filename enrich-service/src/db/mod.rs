//! Enrichment persistence

pub mod enrichments;
pub mod seed;

pub use enrichments::{Completion, EnrichmentStore};
pub use seed::*;
