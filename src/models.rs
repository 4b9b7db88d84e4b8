use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

/// Share of a video's duration that has to be watched before it counts as completed.
pub const COMPLETION_THRESHOLD: f64 = 0.95;

// --- Catalog (public read models) ---

/// Course
///
/// A published course from the `courses` table. Listing and detail are public.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub thumbnail_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Module
///
/// A module of a course, in course order.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Module {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub position: i32,
}

/// Video
///
/// A lecture video. `duration_seconds` drives the completion rule.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Video {
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    pub url: String,
    pub duration_seconds: i32,
}

/// Assessment
///
/// Assessment metadata for a module. Questions are not exposed through the public listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Assessment {
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    pub passing_score: i32,
}

// --- Learner state (keyed by principal subject) ---

/// VideoProgress
///
/// Watch progress of one learner on one video (`video_progress` table).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct VideoProgress {
    pub video_id: i64,
    pub watched_seconds: i32,
    pub completed: bool,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// ProgressUpdate
///
/// Input payload for `POST /api/videos/{id}/progress`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ProgressUpdate {
    #[schema(example = 312)]
    pub watched_seconds: i32,
}

/// FavoriteCourse
///
/// A course the learner has marked as favorite, joined with its title.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct FavoriteCourse {
    pub course_id: i64,
    pub title: String,
    #[ts(type = "string")]
    pub added_at: DateTime<Utc>,
}

/// ProfileResponse
///
/// Output schema for `GET /api/auth/profile`: what the gate resolved for the caller.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct ProfileResponse {
    pub subject: String,
    pub authorities: Vec<String>,
}

/// is_completed
///
/// A video is completed once the watched time reaches 95% of its duration. Videos with
/// no recorded duration complete on any progress report.
pub fn is_completed(watched_seconds: i32, duration_seconds: i32) -> bool {
    if duration_seconds <= 0 {
        return true;
    }
    f64::from(watched_seconds) >= f64::from(duration_seconds) * COMPLETION_THRESHOLD
}
