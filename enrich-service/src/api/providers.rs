//! Provider listing

use axum::{extract::State, Json};

use crate::error::ApiResult;
use crate::models::Provider;
use crate::AppState;

/// GET /providers
///
/// Providers in the order enrichments search them.
pub async fn list_providers(State(state): State<AppState>) -> ApiResult<Json<Vec<Provider>>> {
    Ok(Json(state.service.directory().list_providers()?))
}
