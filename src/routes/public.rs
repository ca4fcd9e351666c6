use crate::{AppState, handlers, redirect::RedirectPaths};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable by any client, logged in or not. The login and
/// access-denied pages live here because they are the guard's redirect
/// targets; guarding them would loop.
pub fn public_routes(redirects: &RedirectPaths) -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe.
        .route("/health", get(|| async { "ok" }))
        // GET /login (configurable)
        // Redirect target for missing or invalid tokens.
        .route(&redirects.login, get(handlers::login_page))
        // GET /access-denied (configurable)
        // Redirect target for route keys absent from the policy table.
        .route(&redirects.access_denied, get(handlers::access_denied_page))
        // POST /auth/login
        // Validates the token and persists the credential record.
        .route("/auth/login", post(handlers::login))
        // POST /auth/logout
        // Always allowed: logging out of an already-dead session is a no-op.
        .route("/auth/logout", post(handlers::logout))
        // POST /auth/refresh
        // Re-runs check_auth_status; also how a session written by another
        // process is picked up, so it cannot require one.
        .route("/auth/refresh", post(handlers::refresh_session))
        // GET /auth/session
        .route("/auth/session", get(handlers::get_session))
        // GET /auth/csrf
        .route("/auth/csrf", get(handlers::get_csrf_token))
}
