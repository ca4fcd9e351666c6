use axum::{
    extract::{FromRef, Request, State},
    http::{HeaderName, StatusCode},
    Router,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Leaves: no dependencies on the session or the router.
pub mod codec;
pub mod token;
pub mod models;
pub mod policy;
pub mod access;
pub mod redirect;

// Stateful layers built on the leaves.
pub mod storage;
pub mod session;
pub mod guard;
pub mod hook;

// HTTP shell.
pub mod config;
pub mod handlers;
pub mod routes;
use routes::{authenticated, portal, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use models::{AccessDecision, CredentialRecord, Role, SessionSnapshot};
pub use session::{SessionError, SessionManager, SessionState};
pub use storage::{FileStorage, MemoryStorage, SecureStore, StorageError, StorageState};

/// ApiDoc
///
/// OpenAPI document for the portal shell, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login, handlers::logout, handlers::get_session, handlers::refresh_session,
        handlers::get_csrf_token, handlers::get_accessible_routes, handlers::check_route_access,
        handlers::guard_decision
    ),
    components(
        schemas(
            models::Role, models::CredentialRecord, models::LoginRequest, models::SessionSnapshot,
            models::AccessDecision, models::AccessibleRoute, models::AccessCheckResponse,
            models::PageView, models::CsrfResponse, models::ErrorBody,
        )
    ),
    tags(
        (name = "portal-gate", description = "Role-based access control for the admin portal")
    )
)]
struct ApiDoc;

/// AppState
///
/// Single shared container for the portal shell: the session of this process
/// and the immutable configuration.
#[derive(Clone)]
pub struct AppState {
    pub session: SessionState,
    pub config: AppConfig,
}

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.session.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// init_session
///
/// Builds the session for `config`: a file-backed persistent store when a
/// storage path is configured (in-memory otherwise), an in-memory session
/// store, then runs the initial `check_auth_status`.
pub fn init_session(config: &AppConfig) -> Result<SessionState, StorageError> {
    let persistent: StorageState = match &config.storage_path {
        Some(path) => Arc::new(FileStorage::open(path)?),
        None => Arc::new(MemoryStorage::new()),
    };
    let session = Arc::new(SessionManager::new(persistent, Arc::new(MemoryStorage::new())));
    session.init();
    Ok(session)
}

/// require_session
///
/// Rejects session API requests with 401 unless the session is authenticated.
async fn require_session(
    State(session): State<SessionState>,
    request: Request,
    next: Next,
) -> Response {
    if !session.snapshot().is_authenticated {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    next.run(request).await
}

/// create_router
///
/// Assembles the portal shell: public routes, the session API, and the guarded
/// portal pages, plus the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes(&state.config.redirects))
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    require_session,
                ))
        )
        // Every page here is checked by the route guard before its handler runs.
        .merge(portal::portal_routes(state.clone()))
        .with_state(state);

    base_router
        .layer(
             ServiceBuilder::new()
                 .layer(SetRequestIdLayer::new(
                     x_request_id.clone(),
                     MakeRequestUuid,
                 ))
                 .layer(
                     TraceLayer::new_for_http()
                         .make_span_with(trace_span_logger)
                         .on_response(
                             DefaultOnResponse::new()
                                 .level(Level::INFO)
                                 .latency_unit(tower_http::LatencyUnit::Millis)
                         )
                 )
                 .layer(PropagateRequestIdLayer::new(x_request_id))
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for each request, tagged with the `x-request-id` so every log line of
/// one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
