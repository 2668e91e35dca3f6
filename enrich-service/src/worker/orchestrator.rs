//! Per-enrichment fan-out and closure
//!
//! Preflight checks the subject, the requested jobs and the provider list,
//! and fixes the success rate for the whole run. Execution spawns one
//! [`JobRunner`] per job on a `JoinSet`, waits for all of them, then forces
//! an empty result onto any job a runner left unresolved.

use super::hint::hint_matches_profile;
use super::job_runner::{JobOutcome, JobRunner};
use super::WorkerContext;
use crate::models::{Enrichment, EnrichmentStatus, JobType, Provider};
use enrich_common::{Error, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Everything needed to run an enrichment's jobs
#[derive(Debug, Clone)]
pub struct Plan {
    pub enrichment_id: Uuid,
    pub subject_id: String,
    pub jobs: BTreeSet<JobType>,
    pub providers: Arc<[Provider]>,
    pub success_rate: f64,
    pub boosted: bool,
}

/// Result of checking whether an enrichment can run
#[derive(Debug, Clone)]
pub enum Preflight {
    Ready(Plan),
    Rejected(String),
}

#[derive(Clone)]
pub struct Orchestrator {
    ctx: Arc<WorkerContext>,
}

impl Orchestrator {
    pub fn new(ctx: Arc<WorkerContext>) -> Self {
        Self { ctx }
    }

    /// Check collaborators and build the run plan
    ///
    /// Rejections (unknown subject, nothing requested, no providers) mean the
    /// enrichment must fail without starting any runner.
    pub fn preflight(&self, enrichment: &Enrichment) -> Result<Preflight> {
        let directory = &self.ctx.directory;

        if directory.find_subject(&enrichment.subject_id)?.is_none() {
            return Ok(Preflight::Rejected(format!(
                "subject {} not found",
                enrichment.subject_id
            )));
        }

        if enrichment.requested_jobs.is_empty() {
            return Ok(Preflight::Rejected("no jobs requested".to_string()));
        }

        let providers = directory.list_providers()?;
        if providers.is_empty() {
            return Ok(Preflight::Rejected("no providers available".to_string()));
        }

        let boosted = match &enrichment.contact_hint {
            Some(hint) => match directory.find_profile(&enrichment.subject_id)? {
                Some(profile) => hint_matches_profile(hint, &profile),
                None => false,
            },
            None => false,
        };

        if enrichment.contact_hint.is_some() && !boosted {
            info!(
                enrichment_id = %enrichment.id,
                "Contact hint does not match known profile, using base success rate"
            );
        }

        let config = &self.ctx.config;
        let success_rate = if boosted {
            config.boosted_success_rate
        } else {
            config.base_success_rate
        };

        Ok(Preflight::Ready(Plan {
            enrichment_id: enrichment.id,
            subject_id: enrichment.subject_id.clone(),
            jobs: enrichment.requested_jobs.clone(),
            providers: providers.into(),
            success_rate,
            boosted,
        }))
    }

    /// Move a record into `in_progress`, or fail it if it cannot run
    ///
    /// Returns the plan to execute, or `None` when the record was failed.
    pub async fn promote(&self, enrichment: &Enrichment) -> Result<Option<Plan>> {
        match self.preflight(enrichment)? {
            Preflight::Rejected(reason) => {
                warn!(enrichment_id = %enrichment.id, "Marking enrichment failed: {}", reason);
                self.ctx
                    .store
                    .set_status(enrichment.id, EnrichmentStatus::Failed, None)
                    .await?;
                Ok(None)
            }
            Preflight::Ready(plan) => {
                if enrichment.status == EnrichmentStatus::Pending {
                    self.ctx
                        .store
                        .set_status(enrichment.id, EnrichmentStatus::InProgress, None)
                        .await?;
                    info!(enrichment_id = %enrichment.id, "Enrichment moved to in_progress");
                }
                Ok(Some(plan))
            }
        }
    }

    /// Run all jobs of a plan concurrently and close the enrichment
    pub async fn execute(&self, plan: Plan) -> Result<()> {
        let id = plan.enrichment_id;

        info!(
            enrichment_id = %id,
            jobs = ?plan.jobs,
            providers = plan.providers.len(),
            success_rate = plan.success_rate,
            boosted = plan.boosted,
            "Processing enrichment"
        );

        let mut runners = JoinSet::new();
        for &job in &plan.jobs {
            let runner = JobRunner::new(
                self.ctx.clone(),
                id,
                plan.subject_id.clone(),
                job,
                plan.providers.clone(),
                plan.success_rate,
            );
            runners.spawn(async move { (job, runner.run().await) });
        }

        while let Some(joined) = runners.join_next().await {
            match joined {
                Ok((job, Ok(JobOutcome::Found { provider_id }))) => {
                    info!(enrichment_id = %id, job = %job, provider_id = %provider_id, "Job found value");
                }
                Ok((job, Ok(outcome))) => {
                    info!(enrichment_id = %id, job = %job, ?outcome, "Job finished");
                }
                Ok((job, Err(e))) => {
                    error!(enrichment_id = %id, job = %job, "Job abandoned: {}", e);
                }
                Err(e) => {
                    error!(enrichment_id = %id, "Job task panicked: {}", e);
                }
            }
        }

        self.close_unresolved(&plan).await
    }

    /// Force `""` + completed onto every requested job still open
    async fn close_unresolved(&self, plan: &Plan) -> Result<()> {
        let id = plan.enrichment_id;
        let store = &self.ctx.store;

        let enrichment = store
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Enrichment {}", id)))?;
        if enrichment.status == EnrichmentStatus::Failed {
            return Ok(());
        }

        for &job in &plan.jobs {
            if !enrichment.is_job_completed(job) {
                warn!(enrichment_id = %id, job = %job, "Closing unresolved job with empty result");
                store.set_result_field(id, job, "").await?;
            }
            // Also re-checks closure for jobs that were already recorded
            store.mark_job_completed(id, job).await?;
        }

        Ok(())
    }

    /// Promote and execute one enrichment to its terminal state
    pub async fn run(&self, id: Uuid) -> Result<()> {
        let enrichment = self
            .ctx
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Enrichment {}", id)))?;

        if enrichment.status.is_terminal() {
            return Ok(());
        }

        match self.promote(&enrichment).await? {
            Some(plan) => self.execute(plan).await,
            None => Ok(()),
        }
    }
}
