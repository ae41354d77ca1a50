//! Credential store for the `users` table.
//!
//! Handlers only ever see the [`UserStore`] trait; the server wires in
//! [`PgUserStore`]. Password hashes stay inside [`User`] and are never
//! serialized or printed.

pub mod password;
pub mod postgres;

pub use postgres::PgUserStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn new(
        id: Uuid,
        email: String,
        password_hash: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            password: password_hash,
            created_at,
            updated_at,
        }
    }

    /// PHC-formatted hash of the user's password.
    #[must_use]
    pub fn password_hash(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,
    #[error("user already exists")]
    Conflict,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("password hash error: {0}")]
    Hash(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Hash `password` and insert a new user row.
    async fn create_user(&self, email: &str, password: &str) -> Result<User, StoreError>;

    /// Point lookup by the unique email key.
    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// Check the backing database is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    fn verify_password(&self, hash: &str, candidate: &str) -> Result<(), StoreError> {
        password::verify(hash, candidate)
    }
}
