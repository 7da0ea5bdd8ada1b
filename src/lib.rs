use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod session;
pub mod storage;
pub mod validation;
pub mod views;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::{RequireAdmin, RequireAuth};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the entry point and tests.
pub use config::AppConfig;
pub use error::AppError;
pub use repository::{PostgresRepository, Repository, RepositoryState};
pub use session::{MemorySessionStore, PgSessionStore, SessionState, SessionStore};
pub use storage::{LocalDiskStorage, MockStorageService, StorageService, StorageState};

/// Request bodies larger than this are rejected before a handler runs. The
/// storage layer applies the stricter 5 MB per-image ceiling itself; this
/// outer limit only bounds the whole multipart envelope.
const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// AppState
///
/// The single, thread-safe, immutable container holding every application
/// collaborator. Shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository layer: account and listing persistence.
    pub repo: RepositoryState,
    /// Session store: opaque token -> identity snapshot.
    pub sessions: SessionState,
    /// Storage layer: profile-image persistence.
    pub storage: StorageState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These let extractors and handlers pull individual collaborators out of
// the shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Route layer for the authenticated tier. The `RequireAuth` extractor
/// resolves the session cookie; an anonymous request is rejected with a
/// redirect to `/login` before the handler runs.
async fn auth_middleware(_auth: RequireAuth, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// admin_middleware
///
/// Route layer for the host management panel. `RequireAdmin` distinguishes
/// anonymous callers (redirected to login) from authenticated non-admins
/// (explicit 403 page).
async fn admin_middleware(_admin: RequireAdmin, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies the tier gates and global
/// middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        // Public routes: no gate.
        .merge(public::public_routes())
        // Authenticated routes: session required, enforced once at the
        // layer boundary.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin routes: the panel paths are top-level (`/index`,
        // `/host/home/{id}`, ...), so the gate is a layer rather than a
        // path prefix.
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), admin_middleware)),
        )
        // Uploaded profile images are served straight from disk.
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        // Anything unmatched renders the 404 page.
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state);

    // Observability and correlation layers, applied outermost.
    base_router.layer(
        ServiceBuilder::new()
            // Unique UUID for every incoming request.
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            // Wrap the request/response lifecycle in a tracing span keyed
            // by that id.
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            // Return the generated x-request-id header to the client.
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: correlates every log line of a request
/// by its x-request-id alongside the method and URI.
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
