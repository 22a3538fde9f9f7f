use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::extract_bearer_token;
use crate::context::{attach, ScopeSlot};

/// Derives the request's security scope before any handler runs.
///
/// Always forwards the request: a missing or bad token just means the slot
/// stays empty, and guards further in decide what that means. The response
/// passes through untouched.
pub async fn attach_scope_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut slot = ScopeSlot::new(Uuid::new_v4());
    let token = extract_bearer_token(request.headers()).map(str::to_string);

    attach(&mut slot, state.decoder.as_ref(), token.as_deref()).await;

    if state.audit_logging {
        if let Some(scope) = slot.scope() {
            tracing::info!(
                request_id = ?slot.request_id(),
                method = %request.method(),
                path = %request.uri().path(),
                user_id = scope.subject_id(),
                role = %scope.role(),
                site_id = ?scope.site_id(),
                subsite_id = ?scope.subsite_id(),
                "audit: scoped request"
            );
        }
    }

    request.extensions_mut().insert(slot);

    next.run(request).await
}
