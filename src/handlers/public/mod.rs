use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::context::CurrentScope;

/// GET / - service banner; `scoped` tells the caller whether its token produced a scope
pub async fn root(CurrentScope(slot): CurrentScope) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "SiteOps API",
            "version": version,
            "scoped": slot.is_authenticated(),
            "endpoints": {
                "health": "/health (public)",
                "whoami": "/api/auth/whoami (scoped)",
                "scope": "/api/scope (scoped)",
                "access": "/api/sites/:site_id[/subsites/:subsite_id]/access (scoped)",
                "workers": "/api/workers (scoped)",
            }
        }
    }))
}

/// GET /health - liveness plus directory reachability
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();

    match state.directory.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "directory": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "directory unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "directory_error": e.to_string()
                }
            })),
        ),
    }
}
