use serde::{Deserialize, Serialize};

use crate::models::Role;
use crate::policy;

/// RedirectPaths
///
/// Fallback destinations used when the route guard denies a request.
/// Loaded once as part of `AppConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectPaths {
    /// Where unauthenticated users are sent.
    pub login: String,
    pub admin_root: String,
    pub tutor_dashboard: String,
    /// Informational page for route keys missing from the policy table.
    pub access_denied: String,
}

impl Default for RedirectPaths {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            admin_root: "/admin".to_string(),
            tutor_dashboard: "/tutor/dashboard".to_string(),
            access_denied: "/access-denied".to_string(),
        }
    }
}

impl RedirectPaths {
    /// role_default_path
    ///
    /// Where a role lands after being denied a route. Evaluated in order:
    /// 1. superadmin / admin -> admin root
    /// 2. tutor -> tutor dashboard
    /// 3. anything else, including unknown or missing roles -> admin root
    pub fn role_default_path(&self, role: Option<&str>) -> &str {
        match role.and_then(Role::parse) {
            Some(r) if policy::admin_roles().contains(&r) => self.admin_root.as_str(),
            Some(Role::Tutor) => self.tutor_dashboard.as_str(),
            _ => self.admin_root.as_str(),
        }
    }

    /// hook_fallback_path
    ///
    /// Two-way split used by the reactive access hook: tutors go to their
    /// dashboard, everyone else to the admin root. Agrees with
    /// `role_default_path` for every input.
    pub fn hook_fallback_path(&self, role: Option<&str>) -> &str {
        match role.and_then(Role::parse) {
            Some(Role::Tutor) => self.tutor_dashboard.as_str(),
            _ => self.admin_root.as_str(),
        }
    }
}
