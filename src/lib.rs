use axum::{
    Router,
    extract::FromRef,
    http::{HeaderName, Method},
    middleware,
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::time::Duration;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod policy;
pub mod repository;
pub mod rules;

// Routers grouped by domain (catalog, learner).
pub mod routes;
use routes::{catalog, learner};

// --- Public Re-exports ---

pub use auth::AuthLayer;
pub use config::AppConfig;
pub use error::ApiError;
pub use identity::{IdentityState, PostgresIdentityStore};
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for every routed handler, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health, handlers::get_courses, handlers::get_course, handlers::get_module,
        handlers::get_module_assessments, handlers::get_video, handlers::record_progress,
        handlers::get_favorites, handlers::add_favorite, handlers::remove_favorite,
        handlers::get_profile
    ),
    components(
        schemas(
            models::Course, models::Module, models::Video, models::Assessment,
            models::VideoProgress, models::ProgressUpdate, models::FavoriteCourse,
            models::ProfileResponse,
        )
    ),
    tags(
        (name = "learnhub", description = "LearnHub e-learning API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable application state: persistence, the auth layer (rule table and
/// token gate) and configuration.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub auth: AuthLayer,
    pub config: AppConfig,
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AuthLayer {
    fn from_ref(app_state: &AppState) -> AuthLayer {
        app_state.auth.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles routes and middleware. Request flow, outermost first:
///
/// CORS -> panic catcher -> request id -> tracing -> token gate -> access enforcement -> handler
///
/// Both auth middlewares are attached with `layer` rather than `route_layer`, so a path
/// with no route still goes through enforcement and answers 401 to anonymous callers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
            Method::HEAD,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly: docs, public catalog, learner routes, then the auth pair.
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(catalog::catalog_routes())
        .merge(learner::learner_routes())
        // Added first, so it runs after the gate.
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth::enforce_access,
        ))
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth::authenticate_request,
        ))
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Panic Catching: a panic below becomes a generic 500.
                .layer(CatchPanicLayer::custom(panic_response))
                // 3b. Request ID Generation: a UUID per incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3c. Request Tracing: one span per request, tagged with its id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3d. Request ID Propagation: echoes x-request-id on the response.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS outermost: preflights are answered before anything else runs.
        .layer(cors)
}

/// panic_response
///
/// A panic anywhere below (auth middlewares included) becomes a generic 500 in the
/// usual error shape.
fn panic_response(_: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("request handler panicked");
    ApiError::internal().into_response()
}

/// trace_span_logger
///
/// Span for every request, carrying the `x-request-id` so all log lines of a request
/// (gate failures included) correlate.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = %request.uri().path(),
        req_id = %request_id,
    )
}
