//! Background enrichment worker
//!
//! - [`scheduler`] polls for due pending records and promotes them
//! - [`orchestrator`] fans one enrichment out into per-job runners and
//!   closes whatever they leave unresolved
//! - [`job_runner`] walks the provider list for one job
//!
//! Runners stop cooperatively: each provider iteration re-reads the record
//! and exits once it is failed or the job is already complete, so a stale
//! runner lags by at most one provider latency window.

pub mod hint;
pub mod job_runner;
pub mod orchestrator;
pub mod random;
pub mod scheduler;

use crate::db::EnrichmentStore;
use crate::directory::Directory;
use enrich_common::config::WorkerConfig;
use std::sync::Arc;

pub use job_runner::{JobOutcome, JobRunner};
pub use orchestrator::{Orchestrator, Plan, Preflight};
pub use random::{Draw, RandomSource, ScriptedRandom, SeededRandom};
pub use scheduler::Scheduler;

/// Collaborators shared by every worker task
pub struct WorkerContext {
    pub store: EnrichmentStore,
    pub directory: Arc<dyn Directory>,
    pub config: WorkerConfig,
    pub random: Arc<dyn RandomSource>,
}

impl WorkerContext {
    pub fn new(
        store: EnrichmentStore,
        directory: Arc<dyn Directory>,
        config: WorkerConfig,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            store,
            directory,
            config,
            random,
        }
    }
}
