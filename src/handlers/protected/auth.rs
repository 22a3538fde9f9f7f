use axum::extract::State;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::app::AppState;
use crate::context::resolver::PRECEDENCE;
use crate::context::RequireScope;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::WorkerRecord;

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub record: Option<WorkerRecord>,
}

/// GET /api/auth/whoami - resolved identity of the caller
///
/// Every well-known field goes through the resolver, so the response shows
/// exactly what downstream handlers would see. The persisted worker record is
/// attached under `record` when the directory has one; it never changes the
/// derived scope.
pub async fn whoami(State(state): State<AppState>, RequireScope { slot, scope }: RequireScope) -> ApiResult<WhoAmI> {
    let fields = PRECEDENCE
        .iter()
        .map(|(field, _)| (field.to_string(), slot.resolve(field).unwrap_or(Value::Null)))
        .collect();

    let record = state.directory.find_principal(scope.subject_id()).await?;

    Ok(ApiResponse::success(WhoAmI { fields, record }))
}
