//! Static demonstration records
//!
//! One record per lifecycle status, created at startup and never promoted.

use super::EnrichmentStore;
use crate::directory::{
    PROVIDER_STARTUPDEV, SUBJECT_ALICE_WILLIAMS, SUBJECT_BOB_JOHNSON, SUBJECT_JANE_SMITH,
    SUBJECT_JOHN_DOE,
};
use crate::models::{Enrichment, EnrichmentStatus, JobType};
use enrich_common::Result;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;
use uuid::{uuid, Uuid};

pub const STATIC_PENDING_ID: Uuid = uuid!("e5f6a7b8-c9d0-1234-ef12-345678901234");
pub const STATIC_IN_PROGRESS_ID: Uuid = uuid!("f6a7b8c9-d0e1-2345-f123-456789012345");
pub const STATIC_COMPLETED_ID: Uuid = uuid!("a7b8c9d0-e1f2-3456-0123-567890123456");
pub const STATIC_FAILED_ID: Uuid = uuid!("b8c9d0e1-f2a3-4567-1234-678901234567");

impl EnrichmentStore {
    /// Insert the static records that are missing; returns how many were added
    pub async fn seed_static(&self) -> Result<usize> {
        let now = self.now();

        let record = |id: Uuid, subject: &str, status: EnrichmentStatus| Enrichment {
            id,
            subject_id: subject.to_string(),
            status,
            requested_jobs: BTreeSet::from([JobType::Phone]),
            completed_jobs: BTreeSet::new(),
            result: BTreeMap::new(),
            current_provider_by_job: BTreeMap::new(),
            contact_hint: None,
            is_static: true,
            created_at: now,
            updated_at: now,
        };

        let mut in_progress = record(STATIC_IN_PROGRESS_ID, SUBJECT_JANE_SMITH, EnrichmentStatus::InProgress);
        in_progress
            .current_provider_by_job
            .insert(JobType::Phone, PROVIDER_STARTUPDEV.to_string());

        let mut completed = record(STATIC_COMPLETED_ID, SUBJECT_BOB_JOHNSON, EnrichmentStatus::Completed);
        completed.completed_jobs.insert(JobType::Phone);
        completed.result.insert(JobType::Phone, "+1-555-234-5678".to_string());

        let records = [
            record(STATIC_PENDING_ID, SUBJECT_JOHN_DOE, EnrichmentStatus::Pending),
            in_progress,
            completed,
            record(STATIC_FAILED_ID, SUBJECT_ALICE_WILLIAMS, EnrichmentStatus::Failed),
        ];

        let mut added = 0;
        for enrichment in &records {
            if self.insert(enrichment).await? {
                added += 1;
            }
        }

        if added > 0 {
            info!("Seeded {} static enrichments", added);
        }
        Ok(added)
    }
}
