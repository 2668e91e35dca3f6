//! Enrichment record and its lifecycle

use chrono::{DateTime, Utc};
use enrich_common::Error;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Attribute an enrichment can resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Phone,
    Email,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Phone => "phone",
            JobType::Email => "email",
        }
    }

    /// Human-readable name used in progress messages
    pub fn label(&self) -> &'static str {
        match self {
            JobType::Phone => "Phone number",
            JobType::Email => "Email",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phone" => Ok(JobType::Phone),
            "email" => Ok(JobType::Email),
            other => Err(Error::InvalidInput(format!("Unknown job type: {}", other))),
        }
    }
}

/// Enrichment lifecycle state
///
/// ```text
/// pending ──> in_progress ──> completed
///    │             │
///    └─────────────┴──> failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl EnrichmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentStatus::Pending => "pending",
            EnrichmentStatus::InProgress => "in_progress",
            EnrichmentStatus::Completed => "completed",
            EnrichmentStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EnrichmentStatus::Completed | EnrichmentStatus::Failed)
    }

    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: EnrichmentStatus) -> bool {
        use EnrichmentStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress) | (InProgress, Completed) | (Pending, Failed) | (InProgress, Failed)
        )
    }
}

impl fmt::Display for EnrichmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrichmentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EnrichmentStatus::Pending),
            "in_progress" => Ok(EnrichmentStatus::InProgress),
            "completed" => Ok(EnrichmentStatus::Completed),
            "failed" => Ok(EnrichmentStatus::Failed),
            other => Err(Error::InvalidInput(format!("Unknown status: {}", other))),
        }
    }
}

/// Optional attributes a caller supplies about the subject
///
/// Only populated fields take part in profile matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactHint {
    #[serde(rename = "linkedInUrl", default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub companies: Vec<String>,
}

/// One request to resolve a set of attributes for one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    pub id: Uuid,
    pub subject_id: String,
    pub status: EnrichmentStatus,
    pub requested_jobs: BTreeSet<JobType>,
    pub completed_jobs: BTreeSet<JobType>,
    /// Empty string means searched and not found; absent means unresolved
    pub result: BTreeMap<JobType, String>,
    /// Provider id currently queried per in-flight job
    pub current_provider_by_job: BTreeMap<JobType, String>,
    pub contact_hint: Option<ContactHint>,
    pub is_static: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Enrichment {
    pub fn is_job_completed(&self, job: JobType) -> bool {
        self.completed_jobs.contains(&job)
    }
}
