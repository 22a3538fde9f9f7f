//! Per-request security scope: who is acting, with which role, inside which
//! site/subsite boundary.

pub mod error;
pub mod filter;
pub mod role;

pub use error::ScopeError;
pub use filter::ScopePredicate;
pub use role::Role;

use serde::{Serialize, Serializer};
use serde::ser::SerializeStruct;

use crate::auth::Claims;

/// Boolean shorthands for "role equals X"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub is_super_admin: bool,
    pub is_admin: bool,
    pub is_supervisor: bool,
    pub is_gh: bool,
}

impl Capabilities {
    fn of(role: Role) -> Self {
        Self {
            is_super_admin: role == Role::SuperAdmin,
            is_admin: role == Role::Admin,
            is_supervisor: role == Role::Supervisor,
            is_gh: role == Role::Gh,
        }
    }
}

/// Role and tenant boundary derived from one request's token.
///
/// Fields are private so the capability flags can only come from
/// [`SecurityScope::new`], which computes them from the role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityScope {
    role: Role,
    site_id: Option<i64>,
    subsite_id: Option<i64>,
    subject_id: i64,
    capabilities: Capabilities,
}

impl SecurityScope {
    pub fn new(role: Role, subject_id: i64, site_id: Option<i64>, subsite_id: Option<i64>) -> Self {
        Self {
            role,
            site_id,
            subsite_id,
            subject_id,
            capabilities: Capabilities::of(role),
        }
    }

    /// Build the scope for an already-validated claim set.
    ///
    /// A non-SUPERADMIN role without a site is accepted; its filters then
    /// match rows whose site is null.
    pub fn derive(claims: &Claims) -> Result<Self, ScopeError> {
        let role: Role = claims.role.parse()?;
        Ok(Self::new(role, claims.id, claims.id_site, claims.id_subsite))
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn site_id(&self) -> Option<i64> {
        self.site_id
    }

    pub fn subsite_id(&self) -> Option<i64> {
        self.subsite_id
    }

    pub fn subject_id(&self) -> i64 {
        self.subject_id
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn is_super_admin(&self) -> bool {
        self.capabilities.is_super_admin
    }

    pub fn is_admin(&self) -> bool {
        self.capabilities.is_admin
    }

    pub fn is_supervisor(&self) -> bool {
        self.capabilities.is_supervisor
    }

    pub fn is_gh(&self) -> bool {
        self.capabilities.is_gh
    }
}

impl Serialize for SecurityScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SecurityScope", 8)?;
        state.serialize_field("userId", &self.subject_id)?;
        state.serialize_field("role", &self.role)?;
        state.serialize_field("siteId", &self.site_id)?;
        state.serialize_field("subsiteId", &self.subsite_id)?;
        state.serialize_field("isSuperAdmin", &self.is_super_admin())?;
        state.serialize_field("isAdmin", &self.is_admin())?;
        state.serialize_field("isSupervisor", &self.is_supervisor())?;
        state.serialize_field("isGH", &self.is_gh())?;
        state.end()
    }
}
