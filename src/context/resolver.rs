//! Field resolution over a [`ScopeSlot`].
//!
//! Each well-known field has an ordered list of places to look. The first
//! place holding a non-null value wins, so the derived scope always shadows
//! the principal projection, which shadows legacy fields, which shadow the
//! raw claims. Once a scope is attached its answer for a scope-backed field
//! is final, absent included; the fallbacks only serve unscoped slots.

use serde_json::Value;

use super::ScopeSlot;
use crate::scope::SecurityScope;

/// Values computed by the scope deriver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    SubjectId,
    SiteId,
    SubsiteId,
    Role,
    IsSuperAdmin,
    IsAdmin,
    IsSupervisor,
    IsGh,
}

impl FieldSource {
    fn read(&self, scope: &SecurityScope) -> Option<Value> {
        match self {
            FieldSource::SubjectId => Some(Value::from(scope.subject_id())),
            FieldSource::SiteId => scope.site_id().map(Value::from),
            FieldSource::SubsiteId => scope.subsite_id().map(Value::from),
            FieldSource::Role => Some(Value::from(scope.role().as_str())),
            FieldSource::IsSuperAdmin => Some(Value::Bool(scope.is_super_admin())),
            FieldSource::IsAdmin => Some(Value::Bool(scope.is_admin())),
            FieldSource::IsSupervisor => Some(Value::Bool(scope.is_supervisor())),
            FieldSource::IsGh => Some(Value::Bool(scope.is_gh())),
        }
    }
}

/// One place a field may live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Scope(FieldSource),
    Principal(&'static str),
    Legacy(&'static str),
    Claim(&'static str),
}

impl Lookup {
    fn read(&self, slot: &ScopeSlot) -> Option<Value> {
        let value = match self {
            Lookup::Scope(source) => slot.scope().and_then(|s| source.read(s)),
            Lookup::Principal(key) => slot.principal().and_then(|p| p.get(key)),
            Lookup::Legacy(key) => slot.legacy().get(*key).cloned(),
            Lookup::Claim(key) => slot.claims().and_then(|c| c.get(key)),
        };
        value.filter(|v| !v.is_null())
    }
}

use FieldSource as F;
use Lookup::{Claim, Legacy, Principal, Scope};

/// Precedence chains for the well-known fields
pub const PRECEDENCE: &[(&str, &[Lookup])] = &[
    ("userId", &[Scope(F::SubjectId), Principal("id"), Legacy("userId"), Claim("id")]),
    ("siteId", &[Scope(F::SiteId), Legacy("siteId"), Claim("id_site")]),
    ("subsiteId", &[Scope(F::SubsiteId), Legacy("subsiteId"), Claim("id_subsite")]),
    ("role", &[Scope(F::Role), Principal("role"), Legacy("role"), Claim("role")]),
    ("isSuperAdmin", &[Scope(F::IsSuperAdmin), Legacy("isSuperAdmin")]),
    ("isAdmin", &[Scope(F::IsAdmin), Legacy("isAdmin")]),
    ("isSupervisor", &[Scope(F::IsSupervisor), Legacy("isSupervisor")]),
    ("isGH", &[Scope(F::IsGh), Legacy("isGH")]),
    ("username", &[Principal("username"), Legacy("username"), Claim("username")]),
    ("name", &[Principal("name"), Legacy("name"), Claim("name")]),
    ("dni", &[Principal("dni"), Legacy("dni"), Claim("dni")]),
    ("phone", &[Principal("phone"), Legacy("phone"), Claim("phone")]),
    ("status", &[Principal("status"), Legacy("status"), Claim("status")]),
];

pub fn chain_for(field: &str) -> Option<&'static [Lookup]> {
    PRECEDENCE
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, chain)| *chain)
}

/// Resolve `field` from the slot. `None` means no location holds it; callers
/// must treat that as unknown, never as elevated access.
pub fn resolve(slot: &ScopeSlot, field: &str) -> Option<Value> {
    match chain_for(field) {
        Some(chain) => {
            for lookup in chain {
                if let (Lookup::Scope(source), Some(scope)) = (lookup, slot.scope()) {
                    return source.read(scope);
                }
                if let Some(value) = lookup.read(slot) {
                    return Some(value);
                }
            }
            None
        }
        None => slot
            .principal()
            .and_then(|p| p.get(field))
            .or_else(|| slot.claims().and_then(|c| c.get(field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Claims;
    use serde_json::json;
    use uuid::Uuid;

    fn slot_for(claims: Claims) -> ScopeSlot {
        let scope = SecurityScope::derive(&claims).unwrap();
        let mut slot = ScopeSlot::new(Uuid::new_v4());
        slot.store(claims, scope);
        slot
    }

    #[test]
    fn test_derived_flag_beats_conflicting_legacy_field() {
        let mut slot = slot_for(Claims::new(1, "SUPERADMIN", None, None, 1));
        slot.set_legacy("isSuperAdmin", json!(false));
        assert_eq!(resolve(&slot, "isSuperAdmin"), Some(json!(true)));

        let mut slot = slot_for(Claims::new(1, "GH", Some(5), None, 1));
        slot.set_legacy("isSuperAdmin", json!(true));
        assert_eq!(resolve(&slot, "isSuperAdmin"), Some(json!(false)));
    }

    #[test]
    fn test_derived_site_beats_legacy_site() {
        let mut slot = slot_for(Claims::new(1, "ADMIN", Some(5), None, 1));
        slot.set_legacy("siteId", json!(99));
        assert_eq!(slot.resolve_i64("siteId"), Some(5));
    }

    #[test]
    fn test_absent_derived_subsite_is_final() {
        let mut slot = slot_for(Claims::new(1, "ADMIN", Some(5), None, 1));
        slot.set_legacy("subsiteId", json!(7));
        assert_eq!(slot.resolve_i64("subsiteId"), None);
    }

    #[test]
    fn test_absent_derived_site_agrees_with_site_filter() {
        let mut slot = slot_for(Claims::new(1, "ADMIN", None, None, 1));
        slot.set_legacy("siteId", json!(99));

        assert_eq!(resolve(&slot, "siteId"), None);
        let filter = slot.scope().map(|s| s.site_filter().to_where());
        assert_eq!(filter, Some(json!({ "siteId": null })));
    }

    #[test]
    fn test_legacy_fields_serve_unscoped_slots() {
        let mut slot = ScopeSlot::default();
        slot.set_legacy("siteId", json!(5));
        slot.set_legacy("isAdmin", json!(true));
        assert_eq!(slot.resolve_i64("siteId"), Some(5));
        assert_eq!(slot.resolve_bool("isAdmin"), Some(true));
    }

    #[test]
    fn test_end_to_end_supervisor_fields() {
        let slot = slot_for(Claims::new(42, "SUPERVISOR", Some(5), Some(2), 1));
        assert_eq!(slot.resolve_i64("userId"), Some(42));
        assert_eq!(slot.resolve_i64("siteId"), Some(5));
        assert_eq!(slot.resolve_i64("subsiteId"), Some(2));
        assert_eq!(slot.resolve_bool("isSupervisor"), Some(true));
        assert_eq!(slot.resolve_bool("isGH"), Some(false));
        assert_eq!(slot.resolve_str("role"), Some("SUPERVISOR".to_string()));
    }

    #[test]
    fn test_profile_fields_and_unknown_fields() {
        let claims = Claims::new(3, "GH", Some(1), None, 1)
            .with_name("Ana")
            .with_extra("costCenter", json!("CC-12"));
        let slot = slot_for(claims);

        assert_eq!(slot.resolve_str("name"), Some("Ana".to_string()));
        assert_eq!(resolve(&slot, "costCenter"), Some(json!("CC-12")));
        assert_eq!(resolve(&slot, "dni"), None);
        assert_eq!(resolve(&slot, "nope"), None);
    }

    #[test]
    fn test_empty_slot_resolves_nothing() {
        let slot = ScopeSlot::default();
        for (field, _) in PRECEDENCE {
            assert_eq!(resolve(&slot, field), None, "field {} should be absent", field);
        }
    }

    #[test]
    fn test_every_flag_chain_starts_with_scope() {
        for (field, chain) in PRECEDENCE {
            if let Some(pos) = chain.iter().position(|l| matches!(l, Lookup::Scope(_))) {
                assert_eq!(pos, 0, "derived value must be checked first for {}", field);
            }
        }
    }
}
