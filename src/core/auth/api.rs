//! User auth API endpoints
//!
//! - POST /api/v1/users/register - Create an account
//! - POST /api/v1/users/login - Login and receive tokens
//! - POST /api/v1/users/logout - Logout (clear the session slot)
//! - POST /api/v1/users/refresh-token - Rotate the refresh token
//! - POST /api/v1/users/change-password - Change password
//! - GET  /api/v1/users/current-user - Get the authenticated user
//!
//! Tokens travel as `HttpOnly`/`Secure` cookies; the refresh endpoint also
//! accepts the token in the request body, and authenticated routes accept a
//! Bearer header as an alternative to the access cookie.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::auth::jwt::TokenPair;
use crate::core::auth::service::{
    AuthError, AuthService, LoginRequest, RefreshRequest, RegisterRequest,
};
use crate::core::db::models::UserResponse;

const ACCESS_COOKIE: &str = "access_token";
const REFRESH_COOKIE: &str = "refresh_token";

/// Auth API state containing the auth service
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: AuthService,
}

/// API error response body
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Map service outcomes to HTTP status codes
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::FieldsRequired => (StatusCode::BAD_REQUEST, "FIELDS_REQUIRED"),
            AuthError::PasswordConfirmMismatch => {
                (StatusCode::BAD_REQUEST, "PASSWORD_CONFIRM_MISMATCH")
            }
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            AuthError::TokenReused => (StatusCode::FORBIDDEN, "TOKEN_REUSED"),
            AuthError::UserNotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            AuthError::EmailAlreadyExists => (StatusCode::CONFLICT, "EMAIL_EXISTS"),
            AuthError::UsernameAlreadyExists => (StatusCode::CONFLICT, "USERNAME_EXISTS"),
            AuthError::Internal(detail) => {
                // Log the detail, never echo it to the client
                tracing::error!(%detail, "internal error");
                let body = ApiError::new("Internal server error", "INTERNAL_ERROR");
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };

        let body = ApiError::new(self.to_string(), code);
        (status, Json(body)).into_response()
    }
}

/// Response for token refresh
#[derive(Debug, Serialize)]
pub struct RefreshApiResponse {
    pub tokens: TokenPair,
}

/// Response for logout
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Request for changing password
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

/// Create the user API router
pub fn user_api_router(state: AuthApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/v1/users/register", post(register_handler))
        .route("/api/v1/users/login", post(login_handler))
        .route("/api/v1/users/logout", post(logout_handler))
        .route("/api/v1/users/refresh-token", post(refresh_handler))
        .route("/api/v1/users/change-password", post(change_password_handler))
        .route("/api/v1/users/current-user", get(current_user_handler))
        .with_state(state)
}

/// Build an HttpOnly + Secure session cookie
fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(true)
        .build()
}

/// Build the removal counterpart of a session cookie
fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

/// POST /api/v1/users/register
async fn register_handler(
    State(state): State<Arc<AuthApiState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    tracing::info!(username = %request.username, "registration attempt");

    let user = state.auth_service.register(request).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/v1/users/login
async fn login_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let response = state.auth_service.login(request).await?;

    let jar = jar
        .add(session_cookie(
            ACCESS_COOKIE,
            response.tokens.access_token.clone(),
        ))
        .add(session_cookie(
            REFRESH_COOKIE,
            response.tokens.refresh_token.clone(),
        ));

    Ok((jar, Json(response)))
}

/// POST /api/v1/users/logout
async fn logout_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    let token = extract_access_token(&jar, &headers)?;
    let user_id = state.auth_service.validate_access_token(&token)?;

    state.auth_service.logout(user_id).await?;

    let jar = jar
        .remove(removal_cookie(ACCESS_COOKIE))
        .remove(removal_cookie(REFRESH_COOKIE));

    Ok((
        jar,
        Json(LogoutResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

/// POST /api/v1/users/refresh-token
///
/// Reads the refresh token from the cookie, falling back to the body.
async fn refresh_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let refresh_token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .or(body.map(|Json(b)| b.refresh_token))
        .ok_or(AuthError::InvalidToken)?;

    let tokens = state
        .auth_service
        .refresh(RefreshRequest { refresh_token })
        .await?;

    let jar = jar
        .add(session_cookie(ACCESS_COOKIE, tokens.access_token.clone()))
        .add(session_cookie(
            REFRESH_COOKIE,
            tokens.refresh_token.clone(),
        ));

    Ok((jar, Json(RefreshApiResponse { tokens })))
}

/// POST /api/v1/users/change-password
async fn change_password_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<SuccessResponse>, AuthError> {
    let token = extract_access_token(&jar, &headers)?;
    let user_id = state.auth_service.validate_access_token(&token)?;

    state
        .auth_service
        .change_password(
            user_id,
            &request.old_password,
            &request.new_password,
            &request.confirm_password,
        )
        .await?;

    Ok(Json(SuccessResponse {
        success: true,
        message: "Password changed successfully".to_string(),
    }))
}

/// GET /api/v1/users/current-user
async fn current_user_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, AuthError> {
    let token = extract_access_token(&jar, &headers)?;

    let user = state.auth_service.current_user(&token).await?;

    Ok(Json(user))
}

/// Extract the access token from the session cookie or the Authorization
/// header
fn extract_access_token(jar: &CookieJar, headers: &HeaderMap) -> Result<String, AuthError> {
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        let value = cookie.value();
        if !value.is_empty() {
            return Ok(value.to_string());
        }
    }

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::InvalidToken)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidToken)?;

    if token.is_empty() {
        return Err(AuthError::InvalidToken);
    }

    Ok(token.to_string())
}
