use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ScopeError;

/// Roles carried in the `role` claim, highest privilege first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "SUPERADMIN")]
    SuperAdmin,
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "SUPERVISOR")]
    Supervisor,
    #[serde(rename = "GH")]
    Gh,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::SuperAdmin, Role::Admin, Role::Supervisor, Role::Gh];

    /// Wire form used in tokens and JSON responses
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPERADMIN",
            Role::Admin => "ADMIN",
            Role::Supervisor => "SUPERVISOR",
            Role::Gh => "GH",
        }
    }
}

impl FromStr for Role {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUPERADMIN" => Ok(Role::SuperAdmin),
            "ADMIN" => Ok(Role::Admin),
            "SUPERVISOR" => Ok(Role::Supervisor),
            "GH" => Ok(Role::Gh),
            other => Err(ScopeError::MalformedScope(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
