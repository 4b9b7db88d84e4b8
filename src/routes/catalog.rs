use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Catalog Router Module
///
/// Read-only catalog browsing. Classified public by the rule table, so anonymous
/// callers get the same answers as signed-in ones.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(handlers::health))
        .route("/api/courses", get(handlers::get_courses))
        .route("/api/courses/{id}", get(handlers::get_course))
        .route("/api/modules/{id}", get(handlers::get_module))
        .route("/api/videos/{id}", get(handlers::get_video))
        // GET /api/public/modules/{id}/assessments
        // Assessment metadata only; taking an assessment is a learner action.
        .route(
            "/api/public/modules/{id}/assessments",
            get(handlers::get_module_assessments),
        )
}
