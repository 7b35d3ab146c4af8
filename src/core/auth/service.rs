//! Authentication service
//!
//! Business logic for registration, login, logout, refresh-token rotation and
//! password change. Coordinates the user store, the password hasher and the
//! JWT service.
//!
//! Each account has a single session slot: logging in overwrites any stored
//! refresh-token digest, rotation replaces it with a compare-and-swap, and
//! logout clears it. A refresh token that no longer matches the stored digest
//! is treated as reused and rejected.

use std::sync::Arc;

use uuid::Uuid;

use crate::core::auth::jwt::{JwtError, JwtService, TokenPair};
use crate::core::auth::password::{self, PasswordError};
use crate::core::db::models::{CreateUser, UserResponse};
use crate::core::db::repositories::user::{StoreError, UserStore, hash_refresh_token};

/// Authentication service error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("All fields are required")]
    FieldsRequired,

    #[error("New password and confirmation do not match")]
    PasswordConfirmMismatch,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Username already taken")]
    UsernameAlreadyExists,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Refresh token reused or superseded")]
    TokenReused,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AuthError::UserNotFound,
            StoreError::EmailAlreadyExists => AuthError::EmailAlreadyExists,
            StoreError::UsernameAlreadyExists => AuthError::UsernameAlreadyExists,
            StoreError::Database(e) => AuthError::Internal(e.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::TokenExpired,
            JwtError::Malformed | JwtError::SignatureInvalid => AuthError::InvalidToken,
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

/// Registration request data. Avatar and cover are opaque URLs already
/// produced by the upload layer.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub avatar_url: String,
    pub cover_url: Option<String>,
}

/// Login request data; either username or email identifies the account
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Authentication response with sanitized user data and tokens
#[derive(Debug, Clone, serde::Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: TokenPair,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    jwt: JwtService,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(store: Arc<dyn UserStore>, jwt: JwtService) -> Self {
        Self { store, jwt }
    }

    /// Register a new user.
    ///
    /// All string fields must be non-blank after trimming; username and email
    /// are stored lower-cased. The response never carries the password hash
    /// or a refresh token. Registration does not start a session.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, AuthError> {
        let username = request.username.trim().to_lowercase();
        let email = request.email.trim().to_lowercase();
        let full_name = request.full_name.trim().to_string();
        let avatar_url = request.avatar_url.trim().to_string();

        if username.is_empty()
            || email.is_empty()
            || full_name.is_empty()
            || request.password.trim().is_empty()
            || avatar_url.is_empty()
        {
            return Err(AuthError::FieldsRequired);
        }

        let cover_url = request
            .cover_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let password_hash = password::hash(&request.password).await?;

        let user = self
            .store
            .create(&CreateUser {
                username,
                email,
                full_name,
                avatar_url,
                cover_url,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user registered");

        Ok(user.into())
    }

    /// Login with username or email plus password.
    ///
    /// On success a fresh token pair is issued and the digest of the new
    /// refresh token is persisted before the response is returned, replacing
    /// any previous session.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        // A blank username counts as absent, so a valid email still logs in
        let identifier = [request.username.as_deref(), request.email.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_lowercase)
            .ok_or(AuthError::FieldsRequired)?;

        let user = self
            .store
            .find_by_username_or_email(&identifier)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !password::verify(&request.password, &user.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.jwt.issue_pair(user.id, &user.email, &user.username)?;

        // Persist before responding: a token the client holds must always be
        // the one the store knows about.
        self.store
            .set_refresh_token_hash(user.id, Some(&hash_refresh_token(&tokens.refresh_token)))
            .await?;

        tracing::info!(user_id = %user.id, "user logged in");

        Ok(AuthResponse {
            user: user.into(),
            tokens,
        })
    }

    /// Logout: clear the stored refresh-token digest.
    ///
    /// Idempotent with respect to the session slot; clearing an already
    /// empty slot succeeds.
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AuthError> {
        self.store.set_refresh_token_hash(user_id, None).await?;

        tracing::info!(%user_id, "user logged out");
        Ok(())
    }

    /// Rotate a refresh token: verify it, check it against the stored digest
    /// and atomically replace it with a new one.
    ///
    /// A structurally valid token whose digest no longer matches the stored
    /// value has been superseded - either an attacker is replaying a captured
    /// token or the legitimate client already rotated. Both cases fail with
    /// [`AuthError::TokenReused`] and the caller must re-authenticate.
    pub async fn refresh(&self, request: RefreshRequest) -> Result<TokenPair, AuthError> {
        let claims = self.jwt.verify_refresh(&request.refresh_token)?;

        let user = self
            .store
            .find_by_id(claims.user_id()?)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let presented = hash_refresh_token(&request.refresh_token);

        let Some(current) = user.refresh_token_hash.as_deref() else {
            // Logged out: nothing to match against
            return Err(AuthError::InvalidToken);
        };

        if presented != current {
            tracing::warn!(user_id = %user.id, "refresh token reuse detected");
            return Err(AuthError::TokenReused);
        }

        let tokens = self.jwt.issue_pair(user.id, &user.email, &user.username)?;
        let new_hash = hash_refresh_token(&tokens.refresh_token);

        let swapped = self
            .store
            .rotate_refresh_token_hash(user.id, &presented, &new_hash)
            .await?;

        if !swapped {
            // A concurrent rotation won the race; this token is superseded
            tracing::warn!(user_id = %user.id, "refresh token rotation lost race");
            return Err(AuthError::TokenReused);
        }

        Ok(tokens)
    }

    /// Change the account password.
    ///
    /// The stored refresh token is left untouched: changing a password does
    /// not end the current session.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        if new_password != confirm_password {
            return Err(AuthError::PasswordConfirmMismatch);
        }

        if new_password.trim().is_empty() {
            return Err(AuthError::FieldsRequired);
        }

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !password::verify(old_password, &user.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let new_hash = password::hash(new_password).await?;
        self.store.set_password_hash(user_id, &new_hash).await?;

        tracing::info!(%user_id, "password changed");
        Ok(())
    }

    /// Get the sanitized user for a valid access token
    pub async fn current_user(&self, access_token: &str) -> Result<UserResponse, AuthError> {
        let claims = self.jwt.verify_access(access_token)?;

        let user = self
            .store
            .find_by_id(claims.user_id()?)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(user.into())
    }

    /// Validate an access token and return the user ID it authenticates
    pub fn validate_access_token(&self, token: &str) -> Result<Uuid, AuthError> {
        let claims = self.jwt.verify_access(token)?;
        Ok(claims.user_id()?)
    }
}
