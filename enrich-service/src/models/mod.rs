//! Domain models
//!
//! Enrichment records and the reference data served by the directory.

pub mod directory;
pub mod enrichment;

pub use directory::{Profile, Provider, Subject, SubjectAttributes};
pub use enrichment::{ContactHint, Enrichment, EnrichmentStatus, JobType};
