use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};
use thiserror::Error;

/// Identity
///
/// The current authorization data of an account, as held by the identity store.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Identity {
    /// The identity key tokens are issued for (the account email).
    pub subject: String,
    /// Granted authorities, e.g. `ROLE_STUDENT`.
    pub authorities: Vec<String>,
    /// Changes whenever the account's credentials change. Tokens embed the value
    /// current at issuance; a mismatch means the token predates the change.
    pub credentials_fingerprint: String,
}

#[derive(Debug, Error)]
pub enum IdentityStoreError {
    #[error("identity store query failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("identity store unavailable: {0}")]
    Unavailable(String),
}

/// IdentityStore
///
/// Point lookup of an identity by subject. The only I/O the token gate performs.
/// `Ok(None)` is the normal "no such subject" answer; `Err` is reserved for store faults.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn load_identity(&self, subject: &str) -> Result<Option<Identity>, IdentityStoreError>;
}

pub type IdentityState = Arc<dyn IdentityStore>;

/// PostgresIdentityStore
///
/// Reads from the `users` table:
///
/// ```sql
/// CREATE TABLE users (
///     email                   TEXT PRIMARY KEY,
///     authorities             TEXT[] NOT NULL DEFAULT '{}',
///     credentials_fingerprint TEXT NOT NULL
/// );
/// ```
pub struct PostgresIdentityStore {
    pool: PgPool,
}

impl PostgresIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PostgresIdentityStore {
    async fn load_identity(&self, subject: &str) -> Result<Option<Identity>, IdentityStoreError> {
        let identity = sqlx::query_as::<_, Identity>(
            r#"
            SELECT email AS subject, authorities, credentials_fingerprint
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(subject)
        .fetch_optional(&self.pool)
        .await?;

        Ok(identity)
    }
}

/// InMemoryIdentityStore
///
/// Map-backed store for tests and embedded setups.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    identities: RwLock<HashMap<String, Identity>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the identity keyed by its subject.
    pub fn upsert(&self, identity: Identity) {
        if let Ok(mut identities) = self.identities.write() {
            identities.insert(identity.subject.clone(), identity);
        }
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn load_identity(&self, subject: &str) -> Result<Option<Identity>, IdentityStoreError> {
        let identities = self
            .identities
            .read()
            .map_err(|_| IdentityStoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(identities.get(subject).cloned())
    }
}
