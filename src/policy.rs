//! Role policy table.
//!
//! Static mapping from a route key to the path template it is served at and
//! the roles allowed to reach it. Route keys are stable identifiers: a page
//! can move to a new path without touching any code that refers to it by key.
//!
//! An empty `allowed_roles` list means "any authenticated role". A key that is
//! not in the table is always a denial.
//!
//! This module is a leaf: it depends on nothing but `models::Role`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::models::{AccessibleRoute, Role};
use Role::*;

/// RoutePolicyEntry
///
/// One protected destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePolicyEntry {
    pub route_key: &'static str,
    pub path_template: &'static str,
    pub allowed_roles: &'static [Role],
}

impl RoutePolicyEntry {
    /// True when the entry only requires an authenticated session.
    pub fn is_authenticated_only(&self) -> bool {
        self.allowed_roles.is_empty()
    }

    pub fn to_accessible_route(&self) -> AccessibleRoute {
        AccessibleRoute {
            route_key: self.route_key.to_string(),
            path_template: self.path_template.to_string(),
            allowed_roles: self.allowed_roles.to_vec(),
        }
    }
}

/// Well-known route keys referenced from code.
pub mod keys {
    pub const DASHBOARD: &str = "dashboard";
    pub const PROFILE: &str = "profile";
    pub const BLOGS: &str = "blogs";
    pub const BLOG_EDIT: &str = "blog-edit";
    pub const DONATIONS: &str = "donations";
    pub const EXPENSES: &str = "expenses";
    pub const FINANCIAL_REPORTS: &str = "financial-reports";
    pub const USERS: &str = "users";
    pub const TUTORS: &str = "tutors";
    pub const COURSES: &str = "courses";
    pub const BOS_MEETINGS: &str = "bos-meetings";
    pub const TRUSTEE_BOARD: &str = "trustee-board";
    pub const DOCUMENT_VERIFICATION: &str = "document-verification";
    pub const CAMPAIGNS: &str = "campaigns";
    pub const AUDIT_LOG: &str = "audit-log";
    pub const TUTOR_DASHBOARD: &str = "tutor-dashboard";
    pub const TUTOR_COURSES: &str = "tutor-courses";
    pub const TUTOR_DOCUMENTS: &str = "tutor-documents";
}

const ADMINS: &[Role] = &[SuperAdmin, Admin];

static ENTRIES: &[RoutePolicyEntry] = &[
    // --- Shared admin surfaces (any authenticated role) ---
    RoutePolicyEntry {
        route_key: keys::DASHBOARD,
        path_template: "/admin",
        allowed_roles: &[],
    },
    RoutePolicyEntry {
        route_key: keys::PROFILE,
        path_template: "/admin/profile",
        allowed_roles: &[],
    },
    // --- Content ---
    RoutePolicyEntry {
        route_key: keys::BLOGS,
        path_template: "/admin/blogs",
        allowed_roles: &[SuperAdmin, Admin, Marketing],
    },
    RoutePolicyEntry {
        route_key: keys::BLOG_EDIT,
        path_template: "/admin/blogs/{id}/edit",
        allowed_roles: &[SuperAdmin, Admin, Marketing],
    },
    RoutePolicyEntry {
        route_key: keys::CAMPAIGNS,
        path_template: "/admin/campaigns",
        allowed_roles: &[SuperAdmin, Marketing],
    },
    // --- Finance ---
    RoutePolicyEntry {
        route_key: keys::DONATIONS,
        path_template: "/admin/donations",
        allowed_roles: &[SuperAdmin, Admin, Financial, Auditor, CommitteeOfTrustees],
    },
    RoutePolicyEntry {
        route_key: keys::EXPENSES,
        path_template: "/admin/expenses",
        allowed_roles: &[SuperAdmin, Admin, Financial, Auditor],
    },
    RoutePolicyEntry {
        route_key: keys::FINANCIAL_REPORTS,
        path_template: "/admin/finance/reports",
        allowed_roles: &[SuperAdmin, Financial, Auditor, CommitteeOfTrustees],
    },
    RoutePolicyEntry {
        route_key: keys::AUDIT_LOG,
        path_template: "/admin/audit",
        allowed_roles: &[Auditor],
    },
    // --- People ---
    RoutePolicyEntry {
        route_key: keys::USERS,
        path_template: "/admin/users",
        allowed_roles: &[SuperAdmin, Admin, UserManagement],
    },
    RoutePolicyEntry {
        route_key: keys::TUTORS,
        path_template: "/admin/tutors",
        allowed_roles: &[SuperAdmin, Admin, TutorManagement],
    },
    RoutePolicyEntry {
        route_key: keys::DOCUMENT_VERIFICATION,
        path_template: "/admin/documents",
        allowed_roles: &[SuperAdmin, Admin, DocumentVerification],
    },
    // --- Academics & governance ---
    RoutePolicyEntry {
        route_key: keys::COURSES,
        path_template: "/admin/courses",
        allowed_roles: &[SuperAdmin, Admin, CourseManagement, BosController],
    },
    RoutePolicyEntry {
        route_key: keys::BOS_MEETINGS,
        path_template: "/admin/bos/meetings",
        allowed_roles: &[SuperAdmin, BosController, BosMembers],
    },
    RoutePolicyEntry {
        route_key: keys::TRUSTEE_BOARD,
        path_template: "/admin/trustees",
        allowed_roles: &[SuperAdmin, CommitteeOfTrustees],
    },
    // --- Tutor area ---
    RoutePolicyEntry {
        route_key: keys::TUTOR_DASHBOARD,
        path_template: "/tutor/dashboard",
        allowed_roles: &[Tutor],
    },
    RoutePolicyEntry {
        route_key: keys::TUTOR_COURSES,
        path_template: "/tutor/courses",
        allowed_roles: &[Tutor],
    },
    RoutePolicyEntry {
        route_key: keys::TUTOR_DOCUMENTS,
        path_template: "/tutor/documents",
        allowed_roles: &[Tutor],
    },
];

static TABLE: LazyLock<BTreeMap<&'static str, RoutePolicyEntry>> =
    LazyLock::new(|| ENTRIES.iter().map(|e| (e.route_key, *e)).collect());

/// Roles that count as administrators for redirect purposes.
pub fn admin_roles() -> &'static [Role] {
    ADMINS
}

/// lookup
///
/// The entry registered under `route_key`, if any.
pub fn lookup(route_key: &str) -> Option<&'static RoutePolicyEntry> {
    TABLE.get(route_key)
}

/// find_by_path
///
/// Reverse lookup from a path template (as matched by the router) to its entry.
pub fn find_by_path(path_template: &str) -> Option<&'static RoutePolicyEntry> {
    TABLE.values().find(|e| e.path_template == path_template)
}

/// Every entry, ordered by route key.
pub fn entries() -> impl Iterator<Item = &'static RoutePolicyEntry> {
    TABLE.values()
}
