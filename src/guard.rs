use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    access,
    models::{AccessDecision, Role},
    policy,
    redirect::RedirectPaths,
    token::is_valid_opt,
};

/// Requirement
///
/// What a guarded surface demands of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement<'a> {
    /// A destination registered in the policy table. Unknown keys are denied.
    RouteKey(&'a str),
    /// An inline allowed-roles list. Empty means authenticated-only.
    AllowedRoles(&'a [Role]),
}

/// evaluate
///
/// The single guard contract shared by every enforcement point:
/// 1. missing or invalid token -> login path
/// 2. route key absent from the policy table -> access-denied path
/// 3. non-empty allowed list without membership -> the role's default path
/// 4. otherwise allow
pub fn evaluate(
    requirement: Requirement<'_>,
    token: Option<&str>,
    role: Option<&str>,
    redirects: &RedirectPaths,
) -> AccessDecision {
    if !is_valid_opt(token) {
        return AccessDecision::RedirectTo(redirects.login.clone());
    }

    let allowed_roles = match requirement {
        Requirement::AllowedRoles(roles) => roles,
        Requirement::RouteKey(key) => match policy::lookup(key) {
            Some(entry) => entry.allowed_roles,
            None => {
                tracing::warn!(route_key = key, "guarded route key is not registered");
                return AccessDecision::RedirectTo(redirects.access_denied.clone());
            }
        },
    };

    if !allowed_roles.is_empty() && !access::has_access(role, Some(allowed_roles)) {
        return AccessDecision::RedirectTo(redirects.role_default_path(role).to_string());
    }

    AccessDecision::Allow
}

/// route_guard
///
/// Middleware wrapping every portal page. The route key is resolved from the
/// matched path template; the current token and role come from the session.
///
/// On `RedirectTo` it answers `303 See Other` straight away, so the page
/// handler never runs and no protected content is produced.
pub async fn route_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let route_key = request
        .extensions()
        .get::<MatchedPath>()
        .and_then(|m| policy::find_by_path(m.as_str()))
        .map_or("", |entry| entry.route_key);

    let snapshot = state.session.snapshot();
    let decision = evaluate(
        Requirement::RouteKey(route_key),
        snapshot.token(),
        snapshot.role(),
        &state.config.redirects,
    );

    match decision {
        AccessDecision::Allow => {
            tracing::debug!(route_key, "guard allowed request");
            next.run(request).await
        }
        AccessDecision::RedirectTo(path) => {
            tracing::debug!(route_key, target = %path, "guard redirected request");
            Redirect::to(&path).into_response()
        }
    }
}
