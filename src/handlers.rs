use crate::{
    AppState,
    auth::{Authenticated, CurrentPrincipal},
    error::ApiError,
    models::{
        self, Assessment, Course, FavoriteCourse, Module, ProfileResponse, ProgressUpdate, Video,
        VideoProgress,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

// --- Operational ---

/// health
///
/// Liveness check. Public.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

// --- Catalog (public) ---

/// get_courses
///
/// [Public Route] Lists all courses. A signed-in caller is only logged, the listing is
/// the same for everyone.
#[utoipa::path(
    get,
    path = "/api/courses",
    responses((status = 200, description = "All courses", body = [Course]))
)]
pub async fn get_courses(
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Json<Vec<Course>> {
    if let Some(principal) = principal {
        tracing::debug!(subject = %principal.subject(), "course listing for signed-in caller");
    }
    Json(state.repo.get_courses().await)
}

/// get_course
///
/// [Public Route] Course detail.
#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course", body = Course),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Course>, ApiError> {
    state
        .repo
        .get_course(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("course not found"))
}

/// get_module
///
/// [Public Route] Module detail.
#[utoipa::path(
    get,
    path = "/api/modules/{id}",
    params(("id" = i64, Path, description = "Module id")),
    responses(
        (status = 200, description = "Module", body = Module),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_module(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Module>, ApiError> {
    state
        .repo
        .get_module(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("module not found"))
}

/// get_module_assessments
///
/// [Public Route] Assessment metadata of a module. 404 when the module itself is unknown,
/// an empty list when it simply has no assessments.
#[utoipa::path(
    get,
    path = "/api/public/modules/{id}/assessments",
    params(("id" = i64, Path, description = "Module id")),
    responses(
        (status = 200, description = "Assessments of the module", body = [Assessment]),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_module_assessments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Assessment>>, ApiError> {
    if state.repo.get_module(id).await.is_none() {
        return Err(ApiError::not_found("module not found"));
    }
    Ok(Json(state.repo.get_module_assessments(id).await))
}

/// get_video
///
/// [Public Route] Video detail.
#[utoipa::path(
    get,
    path = "/api/videos/{id}",
    params(("id" = i64, Path, description = "Video id")),
    responses(
        (status = 200, description = "Video", body = Video),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Video>, ApiError> {
    state
        .repo
        .get_video(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("video not found"))
}

// --- Learner (authenticated) ---

/// record_progress
///
/// [Authenticated Route] Records how far the caller has watched a video. The completion
/// flag is derived here from the video's duration; clients cannot set it.
#[utoipa::path(
    post,
    path = "/api/videos/{id}/progress",
    params(("id" = i64, Path, description = "Video id")),
    request_body = ProgressUpdate,
    responses(
        (status = 200, description = "Progress saved", body = VideoProgress),
        (status = 400, description = "Negative watch time"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn record_progress(
    Authenticated(principal): Authenticated,
    State(state): State<AppState>,
    Path(video_id): Path<i64>,
    Json(payload): Json<ProgressUpdate>,
) -> Result<Json<VideoProgress>, ApiError> {
    if payload.watched_seconds < 0 {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_progress",
            "watched_seconds must not be negative",
        ));
    }

    let video = state
        .repo
        .get_video(video_id)
        .await
        .ok_or_else(|| ApiError::not_found("video not found"))?;

    let watched = payload.watched_seconds.min(video.duration_seconds.max(0));
    let completed = models::is_completed(watched, video.duration_seconds);

    state
        .repo
        .save_progress(principal.subject(), video_id, watched, completed)
        .await
        .map(Json)
        .ok_or_else(ApiError::internal)
}

/// get_favorites
///
/// [Authenticated Route] The caller's favorite courses.
#[utoipa::path(
    get,
    path = "/api/favorites",
    responses(
        (status = 200, description = "Favorite courses", body = [FavoriteCourse]),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn get_favorites(
    Authenticated(principal): Authenticated,
    State(state): State<AppState>,
) -> Json<Vec<FavoriteCourse>> {
    Json(state.repo.get_favorites(principal.subject()).await)
}

/// add_favorite
///
/// [Authenticated Route] Marks a course as favorite. Idempotent.
#[utoipa::path(
    post,
    path = "/api/favorites/{course_id}",
    params(("course_id" = i64, Path, description = "Course id")),
    responses(
        (status = 204, description = "Favorite stored"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn add_favorite(
    Authenticated(principal): Authenticated,
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.repo.get_course(course_id).await.is_none() {
        return Err(ApiError::not_found("course not found"));
    }

    if state.repo.add_favorite(principal.subject(), course_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::internal())
    }
}

/// remove_favorite
///
/// [Authenticated Route] Removes a course from the favorites. Idempotent: removing a
/// course that is not a favorite still answers 204.
#[utoipa::path(
    delete,
    path = "/api/favorites/{course_id}",
    params(("course_id" = i64, Path, description = "Course id")),
    responses(
        (status = 204, description = "Favorite removed"),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn remove_favorite(
    Authenticated(principal): Authenticated,
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.repo.remove_favorite(principal.subject(), course_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::internal())
    }
}

/// get_profile
///
/// [Authenticated Route] What the gate resolved for the caller. Lives under `/api/auth`
/// but is protected by its own rule ahead of the public `/api/auth/**` rule.
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "Caller profile", body = ProfileResponse),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn get_profile(Authenticated(principal): Authenticated) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        subject: principal.subject().to_string(),
        authorities: principal.authorities().to_vec(),
    })
}
