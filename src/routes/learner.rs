use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Learner Router Module
///
/// Everything keyed by the caller's identity. All of it falls under an
/// authenticated rule; the handlers take `Authenticated` as well.
pub fn learner_routes() -> Router<AppState> {
    Router::new()
        // POST /api/videos/{id}/progress
        // Shares its prefix with the public video detail route; only GET is public there.
        .route("/api/videos/{id}/progress", post(handlers::record_progress))
        .route("/api/favorites", get(handlers::get_favorites))
        .route(
            "/api/favorites/{course_id}",
            post(handlers::add_favorite).delete(handlers::remove_favorite),
        )
        // GET /api/auth/profile
        // Sits under the public `/api/auth/**` area, protected by its own earlier rule.
        .route("/api/auth/profile", get(handlers::get_profile))
}
