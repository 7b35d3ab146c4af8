//! User store: lookup, creation and session-slot updates
//!
//! The [`UserStore`] trait is the persistence contract consumed by the auth
//! service. Refresh tokens are stored as SHA-256 hex digests, never raw, and
//! each user record holds at most one digest at a time (single active
//! session). [`PgUserStore`] is the PostgreSQL implementation.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::{CreateUser, User};

/// User store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("User not found")]
    NotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Username already exists")]
    UsernameAlreadyExists,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Hash a refresh token with SHA-256 for at-rest storage and comparison.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Persistence contract required by the auth service.
///
/// All operations are atomic at the single-record level.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user whose username or email matches `identifier`.
    /// Callers pass the identifier already lower-cased.
    async fn find_by_username_or_email(&self, identifier: &str)
    -> Result<Option<User>, StoreError>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Create a new user. Fails with `EmailAlreadyExists` or
    /// `UsernameAlreadyExists` when the unique fields collide.
    async fn create(&self, user: &CreateUser) -> Result<User, StoreError>;

    /// Overwrite the stored refresh-token digest. `None` clears the slot
    /// (logout); any previous value is discarded unconditionally.
    async fn set_refresh_token_hash(&self, id: Uuid, hash: Option<&str>)
    -> Result<(), StoreError>;

    /// Compare-and-swap the refresh-token digest: replaces `expected` with
    /// `new` in a single atomic write and returns whether the swap happened.
    /// Returns `Ok(false)` when the stored digest no longer equals
    /// `expected`, so of two concurrent rotations presenting the same token
    /// at most one can succeed.
    async fn rotate_refresh_token_hash(
        &self,
        id: Uuid,
        expected: &str,
        new: &str,
    ) -> Result<bool, StoreError>;

    /// Replace the stored password hash
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError>;
}

const USER_COLUMNS: &str = "id, username, email, full_name, avatar_url, cover_url, \
     password_hash, refresh_token_hash, created_at, updated_at";

/// PostgreSQL-backed user store
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $1"
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: &CreateUser) -> Result<User, StoreError> {
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(StoreError::EmailAlreadyExists);
        }

        if self.find_by_username(&user.username).await?.is_some() {
            return Err(StoreError::UsernameAlreadyExists);
        }

        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, full_name, avatar_url, cover_url, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar_url)
        .bind(&user.cover_url)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn set_refresh_token_hash(
        &self,
        id: Uuid,
        hash: Option<&str>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn rotate_refresh_token_hash(
        &self,
        id: Uuid,
        expected: &str,
        new: &str,
    ) -> Result<bool, StoreError> {
        // Single-statement CAS: the WHERE clause re-checks the stored digest,
        // so a concurrent rotation that already replaced it makes this a no-op.
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = $3, updated_at = NOW()
            WHERE id = $1 AND refresh_token_hash = $2
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(new)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}
