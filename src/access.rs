//! Access decision engine.
//!
//! Pure functions over the policy table. Nothing here touches storage, the
//! session, or the router, so the guard and the reactive hook can both build
//! on it without a cycle.

use std::collections::BTreeMap;

use crate::models::Role;
use crate::policy::{self, RoutePolicyEntry};

/// has_access
///
/// Strict membership test. A missing or empty role, a missing allowed list, or
/// a role string that names no known role is always a denial.
pub fn has_access(role: Option<&str>, allowed_roles: Option<&[Role]>) -> bool {
    let (Some(role), Some(allowed)) = (role.filter(|r| !r.is_empty()), allowed_roles) else {
        return false;
    };
    Role::parse(role).is_some_and(|r| allowed.contains(&r))
}

/// can_access_route
///
/// Fail-closed single-route check: an unknown route key is `false` for every
/// role, superadmin included.
///
/// Entries with an empty allowed list also report `false` here; those are
/// authenticated-only pages and are admitted by the route guard, not by
/// membership.
pub fn can_access_route(role: Option<&str>, route_key: &str) -> bool {
    match policy::lookup(route_key) {
        Some(entry) => has_access(role, Some(entry.allowed_roles)),
        None => {
            tracing::debug!(route_key, "route key not in policy table, denying");
            false
        }
    }
}

/// get_accessible_routes
///
/// The subset of the policy table the role is a member of, keyed by route key.
pub fn get_accessible_routes(role: Option<&str>) -> BTreeMap<&'static str, &'static RoutePolicyEntry> {
    policy::entries()
        .filter(|entry| has_access(role, Some(entry.allowed_roles)))
        .map(|entry| (entry.route_key, entry))
        .collect()
}

/// format_role_display
///
/// Label shown next to the user's name. Unknown role strings are shown as-is
/// so a bad stored value is visible rather than hidden.
pub fn format_role_display(role: Option<&str>) -> String {
    match role.filter(|r| !r.is_empty()) {
        None => "Unknown".to_string(),
        Some(raw) => Role::parse(raw)
            .map(|r| r.display_name().to_string())
            .unwrap_or_else(|| raw.to_string()),
    }
}
