//! Request-scoped security slot.
//!
//! The scope attacher fills one [`ScopeSlot`] per request and stores it in the
//! request's extensions; handlers and services read it from there.

pub mod extract;
pub mod resolver;

pub use extract::{CurrentScope, RequireScope, SubjectId};
pub use resolver::{resolve, FieldSource, Lookup};

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::auth::{Claims, TokenDecode, TokenDecoder};
use crate::scope::{ScopeError, SecurityScope};

/// Profile view of the acting principal, projected from the claims
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    pub id: i64,
    pub role: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub dni: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
}

impl Principal {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.id,
            role: claims.role.clone(),
            username: claims.username.clone(),
            name: claims.name.clone(),
            dni: claims.dni.clone(),
            phone: claims.phone.clone(),
            status: claims.status.clone(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "id" => Some(Value::from(self.id)),
            "role" => Some(Value::from(self.role.clone())),
            "username" => self.username.clone().map(Value::from),
            "name" => self.name.clone().map(Value::from),
            "dni" => self.dni.clone().map(Value::from),
            "phone" => self.phone.clone().map(Value::from),
            "status" => self.status.clone().map(Value::from),
            _ => None,
        }
    }
}

/// Everything known about the caller for the lifetime of one request.
///
/// An empty slot means "no security context", never "unrestricted".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeSlot {
    request_id: Option<Uuid>,
    claims: Option<Claims>,
    scope: Option<SecurityScope>,
    principal: Option<Principal>,
    legacy: Map<String, Value>,
}

impl ScopeSlot {
    pub fn new(request_id: Uuid) -> Self {
        Self {
            request_id: Some(request_id),
            ..Self::default()
        }
    }

    pub fn request_id(&self) -> Option<Uuid> {
        self.request_id
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    pub fn scope(&self) -> Option<&SecurityScope> {
        self.scope.as_ref()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.scope.is_some()
    }

    /// Flat, loosely typed fields set by older integrations. Lowest trust
    /// after the derived scope and principal.
    pub fn legacy(&self) -> &Map<String, Value> {
        &self.legacy
    }

    pub fn set_legacy(&mut self, key: impl Into<String>, value: Value) {
        self.legacy.insert(key.into(), value);
    }

    /// Store a derived scope together with the claims it came from
    pub fn store(&mut self, claims: Claims, scope: SecurityScope) {
        self.principal = Some(Principal::from_claims(&claims));
        self.claims = Some(claims);
        self.scope = Some(scope);
    }

    /// Field lookup through the precedence table
    pub fn resolve(&self, field: &str) -> Option<Value> {
        resolver::resolve(self, field)
    }

    pub fn resolve_i64(&self, field: &str) -> Option<i64> {
        self.resolve(field).and_then(|v| v.as_i64())
    }

    pub fn resolve_bool(&self, field: &str) -> Option<bool> {
        self.resolve(field).and_then(|v| v.as_bool())
    }

    pub fn resolve_str(&self, field: &str) -> Option<String> {
        self.resolve(field).and_then(|v| v.as_str().map(str::to_string))
    }
}

/// Decode `raw_token` and, when valid, store the derived scope in `slot`.
///
/// Never rejects: a missing, invalid or malformed token leaves the slot as it
/// was. Deciding whether an unscoped request may proceed belongs to the
/// handler's guard.
pub async fn attach(slot: &mut ScopeSlot, decoder: &dyn TokenDecoder, raw_token: Option<&str>) {
    let Some(token) = raw_token else {
        tracing::debug!(request_id = ?slot.request_id, "No bearer token; request proceeds without scope");
        return;
    };

    let claims = match decoder.decode(token).await {
        TokenDecode::Valid(claims) => claims,
        TokenDecode::Invalid(reason) => {
            tracing::debug!(request_id = ?slot.request_id, "Token rejected by decoder: {}", reason);
            return;
        }
    };

    match SecurityScope::derive(&claims) {
        Ok(scope) => {
            tracing::debug!(
                request_id = ?slot.request_id,
                user_id = scope.subject_id(),
                role = %scope.role(),
                site_id = ?scope.site_id(),
                subsite_id = ?scope.subsite_id(),
                "Security scope attached"
            );
            slot.store(claims, scope);
        }
        Err(ScopeError::MalformedScope(role)) => {
            tracing::warn!(
                request_id = ?slot.request_id,
                user_id = claims.id,
                "Malformed scope: token carries unknown role '{}'; request proceeds without scope",
                role
            );
        }
    }
}
