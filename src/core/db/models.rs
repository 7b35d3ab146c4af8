//! Database models for VidTube
//!
//! This module defines the database entity structs that map to PostgreSQL tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// User Model
// ============================================================================

/// User entity representing a registered user.
///
/// `refresh_token_hash` holds the SHA-256 hex digest of the single currently
/// valid refresh token; `None` means no active session. The raw token is never
/// persisted, and neither the hash nor `password_hash` is ever serialized.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_url: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User data for creation (without id and timestamps)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_url: Option<String>,
    pub password_hash: String,
}

/// User without sensitive data (for API responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            cover_url: user.cover_url,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "ana".to_string(),
            email: "ana@x.com".to_string(),
            full_name: "Ana".to_string(),
            avatar_url: "https://cdn.example.com/avatar.png".to_string(),
            cover_url: None,
            password_hash: "$2b$12$secret".to_string(),
            refresh_token_hash: Some("deadbeef".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_serialization_omits_secrets() {
        let user = sample_user();
        let json = serde_json::to_string(&user).unwrap();

        assert!(!json.contains("password_hash"));
        assert!(!json.contains("refresh_token_hash"));
        assert!(!json.contains("$2b$12$secret"));
        assert!(!json.contains("deadbeef"));
        assert!(json.contains("ana@x.com"));
    }

    #[test]
    fn test_user_response_from_user() {
        let user = sample_user();
        let id = user.id;

        let response: UserResponse = user.into();

        assert_eq!(response.id, id);
        assert_eq!(response.username, "ana");
        assert_eq!(response.email, "ana@x.com");
        assert_eq!(response.full_name, "Ana");
        assert!(response.cover_url.is_none());
    }

    #[test]
    fn test_user_response_serialization_has_no_secret_fields() {
        let response: UserResponse = sample_user().into();
        let json = serde_json::to_value(&response).unwrap();

        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("password_hash"));
        assert!(!obj.contains_key("refresh_token_hash"));
    }
}
