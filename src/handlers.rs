use crate::{
    AppState,
    access,
    guard::{self, Requirement},
    models::{
        AccessCheckResponse, AccessDecision, AccessibleRoute, CsrfResponse, ErrorBody,
        LoginRequest, PageView, SessionSnapshot,
    },
    session::{SessionError, SessionState},
};
use axum::{
    Json,
    extract::{MatchedPath, Path, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};

// --- Error Mapping ---

/// Maps session failures onto the HTTP surface. Only login can produce them;
/// the form is expected to display `error` to the user.
impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match self {
            SessionError::InvalidCredential => StatusCode::UNPROCESSABLE_ENTITY,
            SessionError::Disposed => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

// --- Session Handlers ---

/// login
///
/// [Public Route] Persists the credential record supplied by the login form.
/// Rejects tokens that fail validation with 422 after clearing storage.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = SessionSnapshot),
        (status = 422, description = "Invalid credential", body = ErrorBody)
    )
)]
pub async fn login(
    State(session): State<SessionState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionSnapshot>, SessionError> {
    session.login(payload).map(Json)
}

/// logout
///
/// [Public Route] Clears persistent and session-scoped storage. Always succeeds.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 200, description = "Logged out", body = SessionSnapshot))
)]
pub async fn logout(State(session): State<SessionState>) -> Json<SessionSnapshot> {
    Json(session.logout())
}

/// get_session
///
/// [Public Route] Current snapshot of the session state machine.
#[utoipa::path(
    get,
    path = "/auth/session",
    responses((status = 200, description = "Session", body = SessionSnapshot))
)]
pub async fn get_session(State(session): State<SessionState>) -> Json<SessionSnapshot> {
    Json(session.snapshot())
}

/// refresh_session
///
/// [Public Route] Re-reads the credential record from storage. Picks up changes
/// made by other processes and recovers from corrupted records.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses((status = 200, description = "Session re-checked", body = SessionSnapshot))
)]
pub async fn refresh_session(State(session): State<SessionState>) -> Json<SessionSnapshot> {
    Json(session.check_auth_status())
}

/// get_csrf_token
///
/// [Public Route] Session-scoped anti-forgery token, generated lazily.
#[utoipa::path(
    get,
    path = "/auth/csrf",
    responses((status = 200, description = "CSRF token", body = CsrfResponse))
)]
pub async fn get_csrf_token(State(session): State<SessionState>) -> Json<CsrfResponse> {
    Json(CsrfResponse {
        csrf_token: session.csrf_token(),
    })
}

// --- Access Handlers ---

/// get_accessible_routes
///
/// [Session Route] Every policy entry the current role is a member of.
/// Authenticated-only entries are not listed; they are open to every role.
#[utoipa::path(
    get,
    path = "/auth/routes",
    responses(
        (status = 200, description = "Accessible routes", body = [AccessibleRoute]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_accessible_routes(State(session): State<SessionState>) -> Json<Vec<AccessibleRoute>> {
    let snapshot = session.snapshot();
    let routes = access::get_accessible_routes(snapshot.role())
        .into_values()
        .map(|entry| entry.to_accessible_route())
        .collect();
    Json(routes)
}

/// check_route_access
///
/// [Session Route] Single-route membership check for the current role.
/// Unknown route keys report `allowed: false`.
#[utoipa::path(
    get,
    path = "/auth/access/{route_key}",
    params(("route_key" = String, Path, description = "Route key from the policy table")),
    responses(
        (status = 200, description = "Access check", body = AccessCheckResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn check_route_access(
    State(session): State<SessionState>,
    Path(route_key): Path<String>,
) -> Json<AccessCheckResponse> {
    let snapshot = session.snapshot();
    let allowed = access::can_access_route(snapshot.role(), &route_key);
    Json(AccessCheckResponse {
        route_key,
        role: snapshot.role().map(str::to_string),
        allowed,
    })
}

/// guard_decision
///
/// [Session Route] The decision the route guard would take for `route_key`,
/// without performing the redirect. Lets the front-end gate links up front.
#[utoipa::path(
    get,
    path = "/auth/guard/{route_key}",
    params(("route_key" = String, Path, description = "Route key from the policy table")),
    responses(
        (status = 200, description = "Guard decision", body = AccessDecision),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn guard_decision(
    State(state): State<AppState>,
    Path(route_key): Path<String>,
) -> Json<AccessDecision> {
    let snapshot = state.session.snapshot();
    Json(guard::evaluate(
        Requirement::RouteKey(&route_key),
        snapshot.token(),
        snapshot.role(),
        &state.config.redirects,
    ))
}

// --- Page Handlers ---

fn page_view(route_key: &str, path: &str, snapshot: &SessionSnapshot) -> PageView {
    PageView {
        route_key: route_key.to_string(),
        path: path.to_string(),
        user_name: snapshot.user.as_ref().map(|u| u.name.clone()),
        role_display: access::format_role_display(snapshot.role()),
    }
}

/// render_page
///
/// [Guarded Route] Placeholder render for a portal page. Only reached once the
/// route guard has allowed the request.
pub async fn render_page(
    State(session): State<SessionState>,
    matched: MatchedPath,
    uri: Uri,
) -> Json<PageView> {
    let route_key = crate::policy::find_by_path(matched.as_str()).map_or("", |e| e.route_key);
    Json(page_view(route_key, uri.path(), &session.snapshot()))
}

/// login_page
///
/// [Public Route] Target of redirects for unauthenticated sessions.
pub async fn login_page(State(session): State<SessionState>, uri: Uri) -> Json<PageView> {
    Json(page_view("login", uri.path(), &session.snapshot()))
}

/// access_denied_page
///
/// [Public Route] Informational target for requests to unregistered route keys.
pub async fn access_denied_page(State(session): State<SessionState>, uri: Uri) -> Json<PageView> {
    Json(page_view("access-denied", uri.path(), &session.snapshot()))
}
