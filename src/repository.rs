use crate::models::{Assessment, Course, FavoriteCourse, Module, Video, VideoProgress};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

/// Repository Trait
///
/// Persistence contract for the catalog and for learner state. Handlers only see
/// `Arc<dyn Repository>`, so tests swap in an in-memory implementation.
///
/// Learner state is keyed by the principal's subject (the account email), never by
/// anything taken from the request body.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Catalog (public) ---
    async fn get_courses(&self) -> Vec<Course>;
    async fn get_course(&self, id: i64) -> Option<Course>;
    async fn get_module(&self, id: i64) -> Option<Module>;
    async fn get_module_assessments(&self, module_id: i64) -> Vec<Assessment>;
    async fn get_video(&self, id: i64) -> Option<Video>;

    // --- Learner state (protected) ---
    /// Upserts progress. `None` means the write failed.
    async fn save_progress(
        &self,
        subject: &str,
        video_id: i64,
        watched_seconds: i32,
        completed: bool,
    ) -> Option<VideoProgress>;
    async fn get_favorites(&self, subject: &str) -> Vec<FavoriteCourse>;
    // Idempotent: adding an existing favorite is a no-op. Returns false only on failure.
    async fn add_favorite(&self, subject: &str, course_id: i64) -> bool;
    // Idempotent: removing a missing favorite is a no-op. Returns false only on failure.
    async fn remove_favorite(&self, subject: &str, course_id: i64) -> bool;
}

/// RepositoryState
///
/// The shared handle stored in the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Queries are checked at runtime.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_courses(&self) -> Vec<Course> {
        sqlx::query_as::<_, Course>(
            "SELECT id, title, description, instructor, thumbnail_url, created_at FROM courses ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_courses error: {:?}", e);
            vec![]
        })
    }

    async fn get_course(&self, id: i64) -> Option<Course> {
        sqlx::query_as::<_, Course>(
            "SELECT id, title, description, instructor, thumbnail_url, created_at FROM courses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_course error: {:?}", e);
            None
        })
    }

    async fn get_module(&self, id: i64) -> Option<Module> {
        sqlx::query_as::<_, Module>("SELECT id, course_id, title, position FROM modules WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_module error: {:?}", e);
                None
            })
    }

    async fn get_module_assessments(&self, module_id: i64) -> Vec<Assessment> {
        sqlx::query_as::<_, Assessment>(
            "SELECT id, module_id, title, passing_score FROM assessments WHERE module_id = $1 ORDER BY id",
        )
        .bind(module_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_module_assessments error: {:?}", e);
            vec![]
        })
    }

    async fn get_video(&self, id: i64) -> Option<Video> {
        sqlx::query_as::<_, Video>(
            "SELECT id, module_id, title, url, duration_seconds FROM videos WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_video error: {:?}", e);
            None
        })
    }

    /// save_progress
    ///
    /// Upsert on `(user_email, video_id)`. Watched time never moves backwards and a
    /// completed video stays completed.
    async fn save_progress(
        &self,
        subject: &str,
        video_id: i64,
        watched_seconds: i32,
        completed: bool,
    ) -> Option<VideoProgress> {
        sqlx::query_as::<_, VideoProgress>(
            r#"
            INSERT INTO video_progress (user_email, video_id, watched_seconds, completed, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (user_email, video_id) DO UPDATE
            SET watched_seconds = GREATEST(video_progress.watched_seconds, EXCLUDED.watched_seconds),
                completed = video_progress.completed OR EXCLUDED.completed,
                updated_at = NOW()
            RETURNING video_id, watched_seconds, completed, updated_at
            "#,
        )
        .bind(subject)
        .bind(video_id)
        .bind(watched_seconds)
        .bind(completed)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| tracing::error!("save_progress error: {:?}", e))
        .ok()
    }

    async fn get_favorites(&self, subject: &str) -> Vec<FavoriteCourse> {
        sqlx::query_as::<_, FavoriteCourse>(
            r#"
            SELECT f.course_id, c.title, f.added_at
            FROM favorite_courses f
            JOIN courses c ON c.id = f.course_id
            WHERE f.user_email = $1
            ORDER BY f.added_at DESC
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_favorites error: {:?}", e);
            vec![]
        })
    }

    async fn add_favorite(&self, subject: &str, course_id: i64) -> bool {
        let result = sqlx::query(
            "INSERT INTO favorite_courses (user_email, course_id, added_at) VALUES ($1, $2, NOW()) ON CONFLICT DO NOTHING",
        )
        .bind(subject)
        .bind(course_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("add_favorite error: {:?}", e);
                false
            }
        }
    }

    async fn remove_favorite(&self, subject: &str, course_id: i64) -> bool {
        let result = sqlx::query("DELETE FROM favorite_courses WHERE user_email = $1 AND course_id = $2")
            .bind(subject)
            .bind(course_id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("remove_favorite error: {:?}", e);
                false
            }
        }
    }
}
