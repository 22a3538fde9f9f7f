use axum::extract::{Query, State};
use serde::Deserialize;

use crate::app::AppState;
use crate::context::RequireScope;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::WorkerRecord;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerQuery {
    /// Narrow further to one site the caller can see
    pub site_id: Option<i64>,
}

/// GET /api/workers - workers inside the caller's subsite boundary
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<WorkerQuery>,
    RequireScope { scope, .. }: RequireScope,
) -> ApiResult<Vec<WorkerRecord>> {
    if let Some(site_id) = query.site_id {
        if !scope.can_access_site(site_id) {
            return Err(ApiError::forbidden(format!("Site {} is outside your scope", site_id)));
        }
    }

    let mut workers = state.directory.list_workers(&scope.subsite_filter()).await?;
    if let Some(site_id) = query.site_id {
        workers.retain(|w| w.id_site == Some(site_id));
    }

    Ok(ApiResponse::success(workers))
}
