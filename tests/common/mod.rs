#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use learnhub::{
    AppState, AuthLayer,
    auth::{Claims, TokenGate, TokenVerifier},
    config::AppConfig,
    create_router,
    identity::{Identity, IdentityState, IdentityStore, IdentityStoreError, InMemoryIdentityStore},
    models::{Assessment, Course, FavoriteCourse, Module, Video, VideoProgress},
    policy,
    repository::Repository,
};
use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

pub const SECRET: &str = "integration-test-secret";
pub const LEARNER: &str = "learner@example.com";
pub const FINGERPRINT: &str = "fp-2024-01";

// --- Tokens ---

pub fn now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

pub fn sign(claims: &Claims, secret: &str) -> String {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

/// A valid token for `subject`, bound to `fingerprint`, expiring in ten minutes.
pub fn token_for(subject: &str, fingerprint: Option<&str>) -> String {
    sign(
        &Claims {
            sub: subject.to_string(),
            iat: now(),
            exp: now() + 600,
            fpr: fingerprint.map(str::to_string),
            roles: vec![],
        },
        SECRET,
    )
}

pub fn valid_token() -> String {
    token_for(LEARNER, Some(FINGERPRINT))
}

pub fn expired_token() -> String {
    sign(
        &Claims {
            sub: LEARNER.to_string(),
            iat: now() - 7200,
            exp: now() - 3600,
            fpr: Some(FINGERPRINT.to_string()),
            roles: vec![],
        },
        SECRET,
    )
}

/// Replaces one character in the middle of the signature with a different one.
pub fn corrupt_signature(token: &str) -> String {
    let signature_start = token.rfind('.').unwrap() + 1;
    let index = signature_start + (token.len() - signature_start) / 2;
    let original = token.as_bytes()[index];
    let replacement = if original == b'A' { 'B' } else { 'A' };

    let mut corrupted = token.to_string();
    corrupted.replace_range(index..index + 1, &replacement.to_string());
    corrupted
}

// --- Identity store ---

pub fn learner_identity() -> Identity {
    Identity {
        subject: LEARNER.to_string(),
        authorities: vec!["ROLE_STUDENT".to_string()],
        credentials_fingerprint: FINGERPRINT.to_string(),
    }
}

/// Wraps the in-memory store, counting lookups and optionally failing them.
#[derive(Default)]
pub struct CountingIdentityStore {
    inner: InMemoryIdentityStore,
    lookups: AtomicUsize,
    pub fail: bool,
}

impl CountingIdentityStore {
    pub fn with_learner() -> Self {
        let store = Self::default();
        store.inner.upsert(learner_identity());
        store
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn upsert(&self, identity: Identity) {
        self.inner.upsert(identity);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityStore for CountingIdentityStore {
    async fn load_identity(&self, subject: &str) -> Result<Option<Identity>, IdentityStoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(IdentityStoreError::Unavailable("connection refused".to_string()));
        }
        self.inner.load_identity(subject).await
    }
}

// --- Repository ---

/// In-memory catalog: course 17 with module 3 and video 17 (600s).
#[derive(Default)]
pub struct MockRepo {
    pub favorites: Mutex<HashSet<(String, i64)>>,
    pub progress_writes: Mutex<Vec<(String, i64, i32, bool)>>,
}

fn course(id: i64) -> Course {
    Course {
        id,
        title: format!("Course {id}"),
        description: "Intro".to_string(),
        instructor: "Instructor".to_string(),
        thumbnail_url: None,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl Repository for MockRepo {
    async fn get_courses(&self) -> Vec<Course> {
        vec![course(17)]
    }
    async fn get_course(&self, id: i64) -> Option<Course> {
        (id == 17).then(|| course(id))
    }
    async fn get_module(&self, id: i64) -> Option<Module> {
        (id == 3).then(|| Module {
            id,
            course_id: 17,
            title: "Basics".to_string(),
            position: 1,
        })
    }
    async fn get_module_assessments(&self, module_id: i64) -> Vec<Assessment> {
        vec![Assessment {
            id: 1,
            module_id,
            title: "Quiz".to_string(),
            passing_score: 70,
        }]
    }
    async fn get_video(&self, id: i64) -> Option<Video> {
        (id == 17).then(|| Video {
            id,
            module_id: 3,
            title: "Welcome".to_string(),
            url: "https://cdn.example.com/v/17.mp4".to_string(),
            duration_seconds: 600,
        })
    }
    async fn save_progress(
        &self,
        subject: &str,
        video_id: i64,
        watched_seconds: i32,
        completed: bool,
    ) -> Option<VideoProgress> {
        self.progress_writes.lock().unwrap().push((
            subject.to_string(),
            video_id,
            watched_seconds,
            completed,
        ));
        Some(VideoProgress {
            video_id,
            watched_seconds,
            completed,
            updated_at: Utc::now(),
        })
    }
    async fn get_favorites(&self, subject: &str) -> Vec<FavoriteCourse> {
        self.favorites
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == subject)
            .map(|(_, course_id)| FavoriteCourse {
                course_id: *course_id,
                title: format!("Course {course_id}"),
                added_at: Utc::now(),
            })
            .collect()
    }
    async fn add_favorite(&self, subject: &str, course_id: i64) -> bool {
        self.favorites.lock().unwrap().insert((subject.to_string(), course_id));
        true
    }
    async fn remove_favorite(&self, subject: &str, course_id: i64) -> bool {
        self.favorites.lock().unwrap().remove(&(subject.to_string(), course_id));
        true
    }
}

// --- Application ---

pub fn auth_layer(identities: IdentityState) -> AuthLayer {
    let rules = policy::platform_rule_table().unwrap();
    let gate = TokenGate::new(TokenVerifier::new(SECRET, 0), identities);
    AuthLayer::new(rules, gate)
}

pub struct TestApp {
    pub router: Router,
    pub identities: Arc<CountingIdentityStore>,
    pub repo: Arc<MockRepo>,
}

pub fn test_app() -> TestApp {
    let identities = Arc::new(CountingIdentityStore::with_learner());
    let repo = Arc::new(MockRepo::default());

    let state = AppState {
        repo: repo.clone(),
        auth: auth_layer(identities.clone()),
        config: AppConfig {
            jwt_secret: SECRET.to_string(),
            ..AppConfig::default()
        },
    };

    TestApp {
        router: create_router(state),
        identities,
        repo,
    }
}

/// An identity store whose lookups panic.
pub struct PanickingIdentityStore;

#[async_trait]
impl IdentityStore for PanickingIdentityStore {
    async fn load_identity(&self, _subject: &str) -> Result<Option<Identity>, IdentityStoreError> {
        panic!("identity backend exploded");
    }
}

/// The full router over the given identity store.
pub fn app_with_identities(identities: IdentityState) -> Router {
    create_router(AppState {
        repo: Arc::new(MockRepo::default()),
        auth: auth_layer(identities),
        config: AppConfig {
            jwt_secret: SECRET.to_string(),
            ..AppConfig::default()
        },
    })
}
