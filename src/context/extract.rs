use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::ScopeSlot;
use crate::error::ApiError;
use crate::scope::SecurityScope;

/// The request's slot as-is. Never rejects; an unauthenticated request gets
/// an empty slot.
#[derive(Debug, Clone)]
pub struct CurrentScope(pub ScopeSlot);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentScope {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentScope(parts.extensions.get::<ScopeSlot>().cloned().unwrap_or_default()))
    }
}

/// Authentication guard: the handler runs only when a scope was derived
#[derive(Debug, Clone)]
pub struct RequireScope {
    pub slot: ScopeSlot,
    pub scope: SecurityScope,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequireScope {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let slot = parts.extensions.get::<ScopeSlot>().cloned().unwrap_or_default();
        let scope = slot
            .scope()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Valid bearer token required"))?;
        Ok(RequireScope { slot, scope })
    }
}

/// Resolved `userId` of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectId(pub i64);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SubjectId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ScopeSlot>()
            .and_then(|slot| slot.resolve_i64("userId"))
            .map(SubjectId)
            .ok_or_else(|| ApiError::unauthorized("Unable to resolve userId for this request"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::Claims;

    async fn current(CurrentScope(slot): CurrentScope) -> String {
        slot.is_authenticated().to_string()
    }

    async fn subject(SubjectId(id): SubjectId) -> String {
        id.to_string()
    }

    fn scoped_slot() -> ScopeSlot {
        let claims = Claims::new(42, "ADMIN", Some(5), None, 1);
        let scope = SecurityScope::derive(&claims).unwrap();
        let mut slot = ScopeSlot::new(Uuid::new_v4());
        slot.store(claims, scope);
        slot
    }

    async fn call(app: Router, slot: Option<ScopeSlot>) -> (StatusCode, String) {
        let mut req = Request::get("/").body(Body::empty()).unwrap();
        if let Some(slot) = slot {
            req.extensions_mut().insert(slot);
        }
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_current_scope_never_rejects() {
        let app = Router::new().route("/", get(current));
        assert_eq!(call(app.clone(), None).await, (StatusCode::OK, "false".to_string()));
        assert_eq!(call(app, Some(scoped_slot())).await, (StatusCode::OK, "true".to_string()));
    }

    #[tokio::test]
    async fn test_subject_id_requires_resolvable_user() {
        let app = Router::new().route("/", get(subject));
        assert_eq!(call(app.clone(), None).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(call(app, Some(scoped_slot())).await, (StatusCode::OK, "42".to_string()));
    }

    #[tokio::test]
    async fn test_require_scope_rejects_empty_slot() {
        async fn guarded(RequireScope { scope, .. }: RequireScope) -> String {
            scope.role().to_string()
        }

        let app = Router::new().route("/", get(guarded));
        assert_eq!(call(app.clone(), Some(ScopeSlot::default())).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(call(app, Some(scoped_slot())).await, (StatusCode::OK, "ADMIN".to_string()));
    }
}
