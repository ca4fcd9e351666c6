use crate::{AppState, handlers};
use axum::{
    Router,
    routing::get,
};

/// Session Router Module
///
/// Session API available once logged in. Every route here sits behind the
/// `require_session` layer applied in `create_router`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /auth/routes
        // Accessible routes for the current role.
        .route("/auth/routes", get(handlers::get_accessible_routes))
        // GET /auth/access/{route_key}
        .route("/auth/access/{route_key}", get(handlers::check_route_access))
        // GET /auth/guard/{route_key}
        .route("/auth/guard/{route_key}", get(handlers::guard_decision))
}
