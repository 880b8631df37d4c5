//! Credential lookup
//!
//! The users table is owned by user-management flows elsewhere; the auth
//! core only ever reads a password hash by username.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// Read-only access to stored password hashes
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Stored hash for `username`, or `None` if no such user exists
    async fn find_password_hash(
        &self,
        username: &str,
    ) -> Result<Option<String>, CredentialStoreError>;
}

/// Credential store backed by the `users` table
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_password_hash(
        &self,
        username: &str,
    ) -> Result<Option<String>, CredentialStoreError> {
        let hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        Ok(hash)
    }
}

/// In-process credential store, for tests and local development
#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, String>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, username: impl Into<String>, password_hash: impl Into<String>) {
        self.users
            .write()
            .await
            .insert(username.into(), password_hash.into());
    }
}

impl FromIterator<(String, String)> for InMemoryCredentialStore {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            users: RwLock::new(iter.into_iter().collect()),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_password_hash(
        &self,
        username: &str,
    ) -> Result<Option<String>, CredentialStoreError> {
        Ok(self.users.read().await.get(username).cloned())
    }
}
