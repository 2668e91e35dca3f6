//! Enrichment service lifecycle
//!
//! Entry point for callers: creates and reads enrichments, and owns the
//! scheduler task. Creating an enrichment never starts processing; that
//! happens once the scheduler finds it due.

use crate::db::EnrichmentStore;
use crate::directory::Directory;
use crate::models::{ContactHint, Enrichment, JobType, Profile};
use crate::worker::{Draw, Orchestrator, RandomSource, Scheduler, WorkerContext};
use enrich_common::config::WorkerConfig;
use enrich_common::Result;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

pub struct EnrichmentService {
    ctx: Arc<WorkerContext>,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl EnrichmentService {
    pub fn new(
        store: EnrichmentStore,
        directory: Arc<dyn Directory>,
        config: WorkerConfig,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            ctx: Arc::new(WorkerContext::new(store, directory, config, random)),
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn store(&self) -> &EnrichmentStore {
        &self.ctx.store
    }

    pub fn directory(&self) -> &Arc<dyn Directory> {
        &self.ctx.directory
    }

    /// Record a new pending enrichment
    pub async fn create_enrichment(
        &self,
        subject_id: &str,
        requested_jobs: BTreeSet<JobType>,
        contact_hint: Option<ContactHint>,
    ) -> Result<Enrichment> {
        self.ctx
            .store
            .create(subject_id, requested_jobs, contact_hint)
            .await
    }

    pub async fn get_enrichment(&self, id: Uuid) -> Result<Option<Enrichment>> {
        self.ctx.store.get(id).await
    }

    /// Third-party profile by full name, after the simulated lookup latency
    pub async fn lookup_profile(&self, full_name: &str) -> Result<Option<Profile>> {
        let delay = self
            .ctx
            .config
            .lookup_latency_for(self.ctx.random.sample(Draw::ProfileLookup));
        tokio::time::sleep(delay).await;

        self.ctx.directory.find_profile_by_name(full_name)
    }

    /// Scheduler sharing this service's task tracker and stop signal
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(self.ctx.clone(), self.tracker.clone(), self.cancel.clone())
    }

    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(self.ctx.clone())
    }

    /// Launch the scheduler loop
    pub fn start(&self) -> JoinHandle<()> {
        tokio::spawn(self.scheduler().run())
    }

    /// Ask the scheduler loop to exit after its current tick
    ///
    /// Enrichments already being processed keep running.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Number of enrichments currently being processed
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every launched enrichment has finished processing
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}
