//! User repository implementation
//!
//! Provides PostgreSQL-backed storage for Mart users and their ledger totals.

use super::is_unique_violation;
use loyalty_core::{models::User, traits::UserRepository, AppError, AppResult};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of UserRepository
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: sqlx::postgres::PgRow) -> User {
        User {
            login: row.get("login"),
            password_hash: row.get("password_hash"),
            current: row.get("current"),
            withdrawn: row.get("withdrawn"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self, password_hash))]
    async fn create(&self, login: &str, password_hash: &str) -> AppResult<User> {
        debug!("Creating user: {}", login);

        sqlx::query(
            r#"
            INSERT INTO users (login, password_hash)
            VALUES ($1, $2)
            RETURNING login, password_hash, current, withdrawn, created_at
            "#,
        )
        .bind(login)
        .bind(password_hash)
        .map(Self::map_row)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::AlreadyExists(format!("Login '{}' is taken", login))
            } else {
                error!("Database error creating user: {}", e);
                AppError::Database(format!("Failed to create user: {}", e))
            }
        })
    }

    #[instrument(skip(self))]
    async fn find_by_login(&self, login: &str) -> AppResult<Option<User>> {
        debug!("Finding user by login: {}", login);

        sqlx::query(
            r#"
            SELECT login, password_hash, current, withdrawn, created_at
            FROM users
            WHERE login = $1
            "#,
        )
        .bind(login)
        .map(Self::map_row)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding user {}: {}", login, e);
            AppError::Database(format!("Failed to find user: {}", e))
        })
    }
}
