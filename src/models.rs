use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Roles ---

/// Role
///
/// The closed set of roles known to the portal. Wire strings are lower-case
/// except `Financial`, which has always been stored capitalised.
///
/// Roles are flat: membership in a route's allowed list is the only thing the
/// gating path looks at. `rank` is display/sorting metadata only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum Role {
    #[serde(rename = "superadmin")]
    SuperAdmin,
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "committeeoftrustees")]
    CommitteeOfTrustees,
    #[serde(rename = "boscontroller")]
    BosController,
    #[serde(rename = "bosmembers")]
    BosMembers,
    #[serde(rename = "coursemanagement")]
    CourseManagement,
    #[serde(rename = "tutormanagement")]
    TutorManagement,
    #[serde(rename = "usermanagement")]
    UserManagement,
    #[serde(rename = "documentverification")]
    DocumentVerification,
    #[serde(rename = "marketing")]
    Marketing,
    #[serde(rename = "auditor")]
    Auditor,
    #[serde(rename = "tutor")]
    Tutor,
    #[serde(rename = "Financial")]
    Financial,
}

impl Role {
    pub const ALL: [Role; 13] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::CommitteeOfTrustees,
        Role::BosController,
        Role::BosMembers,
        Role::CourseManagement,
        Role::TutorManagement,
        Role::UserManagement,
        Role::DocumentVerification,
        Role::Marketing,
        Role::Auditor,
        Role::Tutor,
        Role::Financial,
    ];

    /// The exact string persisted in storage and sent over the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "superadmin",
            Role::Admin => "admin",
            Role::CommitteeOfTrustees => "committeeoftrustees",
            Role::BosController => "boscontroller",
            Role::BosMembers => "bosmembers",
            Role::CourseManagement => "coursemanagement",
            Role::TutorManagement => "tutormanagement",
            Role::UserManagement => "usermanagement",
            Role::DocumentVerification => "documentverification",
            Role::Marketing => "marketing",
            Role::Auditor => "auditor",
            Role::Tutor => "tutor",
            Role::Financial => "Financial",
        }
    }

    /// parse
    ///
    /// Exact, case-sensitive match against the wire strings. Anything else
    /// (including the empty string) is not a role.
    pub fn parse(value: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.as_str() == value)
    }

    /// Human-readable label used by the portal UI.
    pub fn display_name(self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::Admin => "Admin",
            Role::CommitteeOfTrustees => "Committee of Trustees",
            Role::BosController => "BoS Controller",
            Role::BosMembers => "BoS Members",
            Role::CourseManagement => "Course Management",
            Role::TutorManagement => "Tutor Management",
            Role::UserManagement => "User Management",
            Role::DocumentVerification => "Document Verification",
            Role::Marketing => "Marketing",
            Role::Auditor => "Auditor",
            Role::Tutor => "Tutor",
            Role::Financial => "Financial",
        }
    }

    /// rank
    ///
    /// Auxiliary seniority ranking (higher is more senior). Never consulted by
    /// the access decision engine.
    pub fn rank(self) -> u8 {
        match self {
            Role::SuperAdmin => 100,
            Role::Admin => 90,
            Role::CommitteeOfTrustees => 80,
            Role::BosController => 70,
            Role::Financial => 65,
            Role::Auditor => 60,
            Role::BosMembers => 50,
            Role::CourseManagement => 40,
            Role::TutorManagement => 40,
            Role::UserManagement => 40,
            Role::DocumentVerification => 30,
            Role::Marketing => 30,
            Role::Tutor => 10,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Session Schemas ---

/// CredentialRecord
///
/// The identity persisted for a logged-in user. Each field lives under its own
/// storage key (see `session::keys`), never as one serialized blob.
///
/// `role` stays a string: a value read back from storage may have been written
/// by an older build or tampered with, and an unknown role must simply mean
/// "no access" rather than a failed session load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CredentialRecord {
    pub token: String,
    pub user_id: String,
    pub role: String,
    pub name: String,
    pub is_approved: Option<bool>,
}

impl CredentialRecord {
    /// The parsed role, if the stored string names a known one.
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }
}

/// LoginRequest
///
/// Input payload supplied by the login form (POST /auth/login).
/// `isApproved` is accepted as an alias for front-ends that send camelCase.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub id: String,
    pub role: String,
    pub name: String,
    pub token: String,
    #[serde(default, alias = "isApproved")]
    pub is_approved: Option<bool>,
}

impl From<LoginRequest> for CredentialRecord {
    fn from(req: LoginRequest) -> Self {
        Self {
            token: req.token,
            user_id: req.id,
            role: req.role,
            name: req.name,
            is_approved: req.is_approved,
        }
    }
}

/// SessionSnapshot
///
/// Point-in-time view of the session state machine.
///
/// Invariant: `is_authenticated` implies `user.is_some()` and that the user's
/// token passed the token validator when it was set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub user: Option<CredentialRecord>,
    /// When `check_auth_status` last resolved; `None` while loading.
    #[ts(type = "string | null")]
    pub checked_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    pub fn loading() -> Self {
        Self {
            is_authenticated: false,
            is_loading: true,
            user: None,
            checked_at: None,
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            is_authenticated: false,
            is_loading: false,
            user: None,
            checked_at: Some(Utc::now()),
        }
    }

    pub fn authenticated(user: CredentialRecord) -> Self {
        Self {
            is_authenticated: true,
            is_loading: false,
            user: Some(user),
            checked_at: Some(Utc::now()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.token.as_str())
    }

    pub fn role(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.role.as_str())
    }
}

// --- Access Schemas ---

/// AccessDecision
///
/// Outcome of a route guard evaluation. Denial is not an error: it is a
/// redirect to a fallback destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "decision", content = "path", rename_all = "snake_case")]
#[ts(export)]
pub enum AccessDecision {
    Allow,
    RedirectTo(String),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

/// AccessibleRoute
///
/// Serializable form of a policy entry, returned by GET /auth/routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AccessibleRoute {
    pub route_key: String,
    pub path_template: String,
    pub allowed_roles: Vec<Role>,
}

/// AccessCheckResponse
///
/// Result of a single-route check (GET /auth/access/{route_key}).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AccessCheckResponse {
    pub route_key: String,
    pub role: Option<String>,
    pub allowed: bool,
}

/// PageView
///
/// Placeholder body rendered for a guarded portal page once the guard allows it.
/// The real page content is owned by the front-end.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PageView {
    pub route_key: String,
    pub path: String,
    pub user_name: Option<String>,
    pub role_display: String,
}

/// CsrfResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CsrfResponse {
    pub csrf_token: String,
}

/// ErrorBody
///
/// JSON error payload returned when the login form must show feedback.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorBody {
    pub error: String,
}
