use super::{password, StoreError, User, UserStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    Connection, PgPool, Row,
};
use std::time::Duration;
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// `UserStore` backed by the PostgreSQL `users` table.
#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool for `dsn` and make sure the database answers.
    ///
    /// # Errors
    /// Returns an error if the pool cannot connect or the ping fails.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        let store = Self::new(pool);

        store.ping().await.context("Failed to ping database")?;

        Ok(store)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, email: &str, password: &str) -> Result<User, StoreError> {
        // Argon2 is CPU bound; keep it off the async workers.
        let plaintext = password.to_string();
        let hash = tokio::task::spawn_blocking(move || password::hash(&plaintext))
            .await
            .map_err(|e| StoreError::Hash(e.to_string()))??;

        let now = Utc::now();
        let query = r"
            INSERT INTO users (id, email, password, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password, created_at, updated_at
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );

        match sqlx::query(query)
            .bind(Uuid::new_v4())
            .bind(email)
            .bind(&hash)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
        {
            Ok(row) => Ok(user_from_row(&row)?),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict),
            Err(err) => Err(StoreError::Database(err)),
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let query = r"
            SELECT id, email, password, created_at, updated_at
            FROM users
            WHERE email = $1
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );

        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        match row {
            Some(row) => Ok(user_from_row(&row)?),
            None => Err(StoreError::NotFound),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        async {
            let mut conn = self.pool.acquire().await?;
            conn.ping().await?;
            Ok::<(), StoreError>(())
        }
        .instrument(span)
        .await
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User::new(
        row.try_get("id")?,
        row.try_get("email")?,
        row.try_get("password")?,
        row.try_get("created_at")?,
        row.try_get("updated_at")?,
    ))
}

/// Check for Postgres unique constraint violations (SQLSTATE 23505).
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
