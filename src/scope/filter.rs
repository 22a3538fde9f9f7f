use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::{Capabilities, Role, SecurityScope};

/// Tenant-boundary columns a scope can narrow on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ScopeColumn {
    Site,
    Subsite,
}

impl ScopeColumn {
    /// Key used in JSON where-objects
    fn key(&self) -> &'static str {
        match self {
            ScopeColumn::Site => "siteId",
            ScopeColumn::Subsite => "subsiteId",
        }
    }

    /// Column name in the relational schema
    fn column(&self) -> &'static str {
        match self {
            ScopeColumn::Site => "id_site",
            ScopeColumn::Subsite => "id_subsite",
        }
    }
}

/// Equality on one boundary column. `None` means the column must be null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScopeCondition {
    column: ScopeColumn,
    value: Option<i64>,
}

/// Description of how a query must be narrowed for a scope.
/// Applying it is the persistence layer's job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopePredicate {
    conditions: Vec<ScopeCondition>,
}

impl ScopePredicate {
    pub fn unrestricted() -> Self {
        Self::default()
    }

    fn site(site_id: Option<i64>) -> Self {
        Self {
            conditions: vec![ScopeCondition { column: ScopeColumn::Site, value: site_id }],
        }
    }

    fn site_and_subsite(site_id: Option<i64>, subsite_id: i64) -> Self {
        Self {
            conditions: vec![
                ScopeCondition { column: ScopeColumn::Site, value: site_id },
                ScopeCondition { column: ScopeColumn::Subsite, value: Some(subsite_id) },
            ],
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate the predicate against a row's boundary columns
    pub fn matches(&self, site_id: Option<i64>, subsite_id: Option<i64>) -> bool {
        self.conditions.iter().all(|c| match c.column {
            ScopeColumn::Site => site_id == c.value,
            ScopeColumn::Subsite => subsite_id == c.value,
        })
    }

    /// JSON where-object, e.g. `{"siteId": 5, "subsiteId": 2}`
    pub fn to_where(&self) -> Value {
        let mut map = Map::new();
        for c in &self.conditions {
            map.insert(c.column.key().to_string(), c.value.map(Value::from).unwrap_or(Value::Null));
        }
        Value::Object(map)
    }

    /// Parameterised SQL fragment with placeholders numbered from `first_param`.
    /// Null conditions render as `IS NULL` and bind nothing.
    pub fn to_sql(&self, first_param: usize) -> (String, Vec<i64>) {
        if self.conditions.is_empty() {
            return ("1=1".to_string(), vec![]);
        }

        let mut params = vec![];
        let mut parts = vec![];
        for c in &self.conditions {
            match c.value {
                Some(v) => {
                    params.push(v);
                    parts.push(format!("\"{}\" = ${}", c.column.column(), first_param + params.len() - 1));
                }
                None => parts.push(format!("\"{}\" IS NULL", c.column.column())),
            }
        }
        (parts.join(" AND "), params)
    }
}

impl Serialize for ScopePredicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_where().serialize(serializer)
    }
}

impl SecurityScope {
    /// Site narrowing: nothing for SUPERADMIN, the scope's own site for everyone else
    pub fn site_filter(&self) -> ScopePredicate {
        if self.is_super_admin() {
            ScopePredicate::unrestricted()
        } else {
            ScopePredicate::site(self.site_id)
        }
    }

    /// Subsite narrowing. Only a SUPERVISOR with a subsite gets the finer
    /// boundary; ADMIN stays site-wide even when it carries a subsite claim.
    pub fn subsite_filter(&self) -> ScopePredicate {
        debug_assert_eq!(
            self.capabilities,
            Capabilities::of(self.role),
            "capability flags out of sync with role {}",
            self.role
        );

        match (self.role, self.subsite_id) {
            (Role::SuperAdmin, _) => ScopePredicate::unrestricted(),
            (Role::Supervisor, Some(subsite_id)) => ScopePredicate::site_and_subsite(self.site_id, subsite_id),
            (Role::Supervisor, None) | (Role::Admin, _) | (Role::Gh, _) => ScopePredicate::site(self.site_id),
        }
    }

    pub fn can_access_site(&self, target_site_id: i64) -> bool {
        self.is_super_admin() || self.site_id == Some(target_site_id)
    }

    pub fn can_access_subsite(&self, target_site_id: i64, target_subsite_id: i64) -> bool {
        match self.role {
            Role::SuperAdmin => true,
            Role::Admin => self.site_id == Some(target_site_id),
            Role::Supervisor => {
                self.site_id == Some(target_site_id) && self.subsite_id == Some(target_subsite_id)
            }
            Role::Gh => false,
        }
    }
}
