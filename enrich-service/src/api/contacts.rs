//! Subject and third-party profile lookups

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{ApiError, ApiResult};
use crate::models::{Profile, Subject};
use crate::AppState;

/// GET /contacts
pub async fn list_contacts(State(state): State<AppState>) -> ApiResult<Json<Vec<Subject>>> {
    Ok(Json(state.service.directory().list_subjects()?))
}

/// GET /contact/:id
///
/// Phone and email reflect what completed enrichments have discovered.
pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Subject>> {
    state
        .service
        .directory()
        .find_subject(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("contact not found".to_string()))
}

/// GET /thirdparty/:full_name
///
/// The name is matched case-insensitively. Responds after the configured
/// lookup latency, like a remote profile service would.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(full_name): Path<String>,
) -> ApiResult<Json<Profile>> {
    state
        .service
        .lookup_profile(full_name.trim())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("third-party information not found".to_string()))
}
