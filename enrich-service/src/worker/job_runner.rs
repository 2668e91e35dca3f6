//! Resolves one job of one enrichment by walking the provider list

use super::random::Draw;
use super::WorkerContext;
use crate::models::{EnrichmentStatus, JobType, Provider};
use enrich_common::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How a runner finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// A provider found the value
    Found { provider_id: String },
    /// Every provider was tried without a hit; recorded as `""`
    Exhausted,
    /// Record failed, vanished, or the job was already complete
    Stopped,
}

/// Unit of concurrent work: one `(enrichment, job)` pair
pub struct JobRunner {
    ctx: Arc<WorkerContext>,
    enrichment_id: Uuid,
    subject_id: String,
    job: JobType,
    providers: Arc<[Provider]>,
    success_rate: f64,
}

impl JobRunner {
    pub fn new(
        ctx: Arc<WorkerContext>,
        enrichment_id: Uuid,
        subject_id: String,
        job: JobType,
        providers: Arc<[Provider]>,
        success_rate: f64,
    ) -> Self {
        Self {
            ctx,
            enrichment_id,
            subject_id,
            job,
            providers,
            success_rate,
        }
    }

    /// Try providers in order until one finds the value or all are exhausted
    ///
    /// Store and directory faults are returned to the caller; the job is
    /// left unresolved in that case.
    pub async fn run(self) -> Result<JobOutcome> {
        let id = self.enrichment_id;
        let job = self.job;
        let store = &self.ctx.store;

        debug!(enrichment_id = %id, job = %job, "Starting job");

        for (attempt, provider) in self.providers.iter().enumerate() {
            let Some(enrichment) = store.get(id).await? else {
                warn!(enrichment_id = %id, job = %job, "Enrichment disappeared, stopping job");
                return Ok(JobOutcome::Stopped);
            };
            if enrichment.status == EnrichmentStatus::Failed {
                info!(enrichment_id = %id, job = %job, "Enrichment failed, stopping job");
                return Ok(JobOutcome::Stopped);
            }
            if enrichment.is_job_completed(job) {
                debug!(enrichment_id = %id, job = %job, "Job already completed");
                return Ok(JobOutcome::Stopped);
            }

            debug!(enrichment_id = %id, job = %job, provider = %provider.name, "Checking provider");
            store.set_job_provider(id, job, Some(provider.id.as_str())).await?;

            let latency = self
                .ctx
                .config
                .latency_for(self.ctx.random.sample(Draw::Latency { job, attempt }));
            tokio::time::sleep(latency).await;

            if self.ctx.random.sample(Draw::Success { job, attempt }) >= self.success_rate {
                debug!(enrichment_id = %id, job = %job, provider = %provider.name, "Provider missed");
                continue;
            }

            let value = self
                .ctx
                .directory
                .find_subject_attributes(&self.subject_id)?
                .and_then(|attrs| attrs.get(job).map(str::to_string));

            let Some(value) = value else {
                debug!(
                    enrichment_id = %id,
                    job = %job,
                    provider = %provider.name,
                    "Provider hit but no {} on record",
                    job
                );
                continue;
            };

            store.set_result_field(id, job, &value).await?;
            store.set_job_provider(id, job, None).await?;

            if let Err(e) = self
                .ctx
                .directory
                .record_resolved_attribute(&self.subject_id, job, &value)
            {
                warn!(enrichment_id = %id, job = %job, "Failed to update subject: {}", e);
            }

            store.mark_job_completed(id, job).await?;

            info!(enrichment_id = %id, job = %job, provider = %provider.name, "Value found");
            return Ok(JobOutcome::Found {
                provider_id: provider.id.clone(),
            });
        }

        info!(
            enrichment_id = %id,
            job = %job,
            providers = self.providers.len(),
            "All providers checked, value not found"
        );
        store.set_result_field(id, job, "").await?;
        store.set_job_provider(id, job, None).await?;
        store.mark_job_completed(id, job).await?;

        Ok(JobOutcome::Exhausted)
    }
}
