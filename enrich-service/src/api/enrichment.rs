//! Enrichment start and progress endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use enrich_common::uuid_utils;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use crate::directory::Directory;
use crate::error::{ApiError, ApiResult};
use crate::models::{ContactHint, Enrichment, EnrichmentStatus, JobType, Provider};
use crate::AppState;

/// POST /enrichment/start request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartEnrichmentRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub jobs: Option<Vec<String>>,
    /// Optional hint that raises the success rate when it matches the profile
    #[serde(default)]
    pub contact: Option<ContactHint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartEnrichmentResponse {
    pub id: String,
    pub status: EnrichmentStatus,
    pub message: String,
}

/// Progress of one job
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_provider: Option<Provider>,
    pub result: String,
    pub message: String,
    pub pending: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentView {
    pub id: String,
    pub user_id: String,
    pub status: EnrichmentStatus,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub result: BTreeMap<JobType, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<JobView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<JobView>,
}

/// Requested jobs, restricted to known types
///
/// Empty input means the default job set; input with nothing usable is an
/// error.
fn parse_jobs(jobs: &[String]) -> ApiResult<BTreeSet<JobType>> {
    let parsed: BTreeSet<JobType> = jobs.iter().filter_map(|j| j.parse().ok()).collect();

    if !jobs.is_empty() && parsed.is_empty() {
        return Err(ApiError::BadRequest(
            "jobs must contain 'phone' and/or 'email'".to_string(),
        ));
    }
    Ok(parsed)
}

/// POST /enrichment/start
///
/// Records a pending enrichment. Processing starts once the scheduler
/// promotes it.
pub async fn start_enrichment(
    State(state): State<AppState>,
    body: Result<Json<StartEnrichmentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StartEnrichmentResponse>)> {
    let Json(request) =
        body.map_err(|e| ApiError::BadRequest(format!("invalid request body: {}", e.body_text())))?;

    let user_id = request.user_id.as_deref().map(str::trim).unwrap_or_default();
    if user_id.is_empty() {
        return Err(ApiError::BadRequest("userId is required".to_string()));
    }

    let jobs = parse_jobs(request.jobs.as_deref().unwrap_or_default())?;
    let enrichment = state
        .service
        .create_enrichment(user_id, jobs, request.contact)
        .await?;

    info!(
        enrichment_id = %enrichment.id,
        subject_id = %enrichment.subject_id,
        jobs = ?enrichment.requested_jobs,
        "Enrichment requested"
    );

    Ok((
        StatusCode::CREATED,
        Json(StartEnrichmentResponse {
            id: enrichment.id.to_string(),
            status: enrichment.status,
            message: "Enrichment started successfully".to_string(),
        }),
    ))
}

/// GET /enrichment/:id
pub async fn get_enrichment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<EnrichmentView>> {
    let id = uuid_utils::parse(&id)?;
    let enrichment = state
        .service
        .get_enrichment(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("enrichment not found".to_string()))?;

    let directory = state.service.directory();
    let phone = job_view(&enrichment, JobType::Phone, directory.as_ref())?;
    let email = job_view(&enrichment, JobType::Email, directory.as_ref())?;

    Ok(Json(EnrichmentView {
        id: enrichment.id.to_string(),
        user_id: enrichment.subject_id,
        status: enrichment.status,
        created_at: enrichment.created_at.to_rfc3339(),
        updated_at: enrichment.updated_at.to_rfc3339(),
        result: enrichment.result,
        phone,
        email,
    }))
}

fn job_view(
    enrichment: &Enrichment,
    job: JobType,
    directory: &dyn Directory,
) -> ApiResult<Option<JobView>> {
    if !enrichment.requested_jobs.contains(&job) {
        return Ok(None);
    }

    let current_provider = match enrichment.current_provider_by_job.get(&job) {
        Some(provider_id) => directory.find_provider(provider_id)?,
        None => None,
    };

    let completed = enrichment.is_job_completed(job);
    let result = enrichment.result.get(&job).cloned().unwrap_or_default();
    let message = if !completed {
        format!("Searching for {}...", job.label().to_lowercase())
    } else if result.is_empty() {
        format!("{} not found after checking all providers", job.label())
    } else {
        format!("{} found successfully", job.label())
    };

    Ok(Some(JobView {
        current_provider,
        result: if completed { result } else { String::new() },
        message,
        pending: !completed,
    }))
}
