use crate::{AppState, guard, handlers, policy};
use axum::{Router, middleware, routing::get};

/// Portal Router Module
///
/// One GET route per policy table entry, served at the entry's path template.
/// The whole router is wrapped in `guard::route_guard`, so a page handler only
/// runs after the guard has allowed the request.
pub fn portal_routes(state: AppState) -> Router<AppState> {
    policy::entries()
        .fold(Router::<AppState>::new(), |router, entry| {
            router.route(entry.path_template, get(handlers::render_page))
        })
        .route_layer(middleware::from_fn_with_state(state, guard::route_guard))
}
