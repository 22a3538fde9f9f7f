use axum::extract::Path;
use serde::Serialize;
use serde_json::{json, Value};

use crate::context::RequireScope;
use crate::middleware::{ApiResponse, ApiResult};
use crate::scope::{ScopePredicate, SecurityScope};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeView {
    pub scope: SecurityScope,
    pub site_filter: ScopePredicate,
    pub subsite_filter: ScopePredicate,
    pub sql: Value,
}

fn sql_view(predicate: &ScopePredicate) -> Value {
    let (clause, params) = predicate.to_sql(1);
    json!({ "where": clause, "params": params })
}

/// GET /api/scope - derived scope and the filters services will apply
pub async fn show(RequireScope { scope, .. }: RequireScope) -> ApiResult<ScopeView> {
    let site_filter = scope.site_filter();
    let subsite_filter = scope.subsite_filter();
    let sql = json!({
        "site": sql_view(&site_filter),
        "subsite": sql_view(&subsite_filter),
    });

    Ok(ApiResponse::success(ScopeView {
        scope,
        site_filter,
        subsite_filter,
        sql,
    }))
}

/// GET /api/sites/:site_id/access
pub async fn site_access(Path(site_id): Path<i64>, RequireScope { scope, .. }: RequireScope) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "siteId": site_id,
        "allowed": scope.can_access_site(site_id),
    })))
}

/// GET /api/sites/:site_id/subsites/:subsite_id/access
pub async fn subsite_access(
    Path((site_id, subsite_id)): Path<(i64, i64)>,
    RequireScope { scope, .. }: RequireScope,
) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "siteId": site_id,
        "subsiteId": subsite_id,
        "allowed": scope.can_access_subsite(site_id, subsite_id),
    })))
}
