//! JWT issuance and verification for access and refresh tokens.
//!
//! Tokens are signed with HS256. Access and refresh tokens use distinct
//! secrets, so possession of one kind can never forge the other: a refresh
//! token presented where an access token is expected fails signature
//! verification outright. Access tokens are short-lived (minutes), refresh
//! tokens long-lived (days); expiry is checked lazily at verification time.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default access token expiration time (15 minutes)
const ACCESS_TOKEN_EXPIRATION_MINUTES: i64 = 15;

/// Default refresh token expiration time (7 days)
const REFRESH_TOKEN_EXPIRATION_DAYS: i64 = 7;

const DEFAULT_ISSUER: &str = "vidtube";

/// Token signing configuration
#[derive(Clone)]
pub struct TokenConfig {
    /// Secret for signing access tokens
    pub access_secret: String,
    /// Secret for signing refresh tokens; must differ from `access_secret`
    pub refresh_secret: String,
    /// Access token expiration in minutes
    pub access_expiration_minutes: i64,
    /// Refresh token expiration in days
    pub refresh_expiration_days: i64,
    /// Token issuer
    pub issuer: String,
}

impl TokenConfig {
    /// Create a new token configuration with default expirations
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_expiration_minutes: ACCESS_TOKEN_EXPIRATION_MINUTES,
            refresh_expiration_days: REFRESH_TOKEN_EXPIRATION_DAYS,
            issuer: DEFAULT_ISSUER.to_string(),
        }
    }

    /// Create config from environment variables
    pub fn from_env() -> Result<Self, JwtError> {
        let access_secret = std::env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| JwtError::MissingSecret("ACCESS_TOKEN_SECRET"))?;
        let refresh_secret = std::env::var("REFRESH_TOKEN_SECRET")
            .map_err(|_| JwtError::MissingSecret("REFRESH_TOKEN_SECRET"))?;

        let access_exp = std::env::var("ACCESS_TOKEN_EXPIRY_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(ACCESS_TOKEN_EXPIRATION_MINUTES);

        let refresh_exp = std::env::var("REFRESH_TOKEN_EXPIRY_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(REFRESH_TOKEN_EXPIRATION_DAYS);

        let issuer = std::env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string());

        Ok(Self {
            access_expiration_minutes: access_exp,
            refresh_expiration_days: refresh_exp,
            issuer,
            ..Self::new(access_secret, refresh_secret)
        })
    }

    /// Set access token expiration
    pub fn access_expiration(mut self, minutes: i64) -> Self {
        self.access_expiration_minutes = minutes;
        self
    }

    /// Set refresh token expiration
    pub fn refresh_expiration(mut self, days: i64) -> Self {
        self.refresh_expiration_days = days;
        self
    }

    /// Set issuer
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }
}

/// JWT errors
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("{0} environment variable not set")]
    MissingSecret(&'static str),

    #[error("Access and refresh token secrets must be distinct")]
    SecretsNotDistinct,

    #[error("Token encoding failed: {0}")]
    Encoding(String),

    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    SignatureInvalid,

    #[error("Token expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                JwtError::SignatureInvalid
            }
            _ => JwtError::Malformed,
        }
    }
}

/// Claims carried by an access token
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    /// User email
    pub email: String,
    /// Username
    pub username: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Unique identifier for this token
    pub jti: String,
}

/// Claims carried by a refresh token. Deliberately minimal: only the subject,
/// since everything else is re-read from the store at rotation time.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Unique identifier for this token
    pub jti: String,
}

impl AccessClaims {
    /// Get user ID as UUID
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::Malformed)
    }
}

impl RefreshClaims {
    /// Get user ID as UUID
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::Malformed)
    }
}

/// Token pair (access + refresh)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token (short-lived)
    pub access_token: String,
    /// Refresh token (long-lived)
    pub refresh_token: String,
    /// Access token expiration (Unix timestamp)
    pub access_expires_at: i64,
    /// Refresh token expiration (Unix timestamp)
    pub refresh_expires_at: i64,
    /// Token type (always "Bearer")
    pub token_type: String,
}

/// JWT service for token operations
#[derive(Clone)]
pub struct JwtService {
    config: TokenConfig,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl JwtService {
    /// Create a new JWT service. Fails if the two secrets are equal, since a
    /// shared secret would let a refresh token stand in for an access token.
    pub fn new(config: TokenConfig) -> Result<Self, JwtError> {
        if config.access_secret == config.refresh_secret {
            return Err(JwtError::SecretsNotDistinct);
        }

        let access_encoding = EncodingKey::from_secret(config.access_secret.as_bytes());
        let access_decoding = DecodingKey::from_secret(config.access_secret.as_bytes());
        let refresh_encoding = EncodingKey::from_secret(config.refresh_secret.as_bytes());
        let refresh_decoding = DecodingKey::from_secret(config.refresh_secret.as_bytes());

        Ok(Self {
            config,
            access_encoding,
            access_decoding,
            refresh_encoding,
            refresh_decoding,
        })
    }

    /// Create JWT service from environment variables
    pub fn from_env() -> Result<Self, JwtError> {
        Self::new(TokenConfig::from_env()?)
    }

    /// Issue an access token for a user
    pub fn issue_access(
        &self,
        user_id: Uuid,
        email: &str,
        username: &str,
    ) -> Result<(String, i64), JwtError> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.config.access_expiration_minutes);

        let claims = AccessClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|e| JwtError::Encoding(e.to_string()))?;

        Ok((token, exp.timestamp()))
    }

    /// Issue a refresh token for a user
    pub fn issue_refresh(&self, user_id: Uuid) -> Result<(String, i64), JwtError> {
        let now = Utc::now();
        let exp = now + Duration::days(self.config.refresh_expiration_days);

        let claims = RefreshClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(|e| JwtError::Encoding(e.to_string()))?;

        Ok((token, exp.timestamp()))
    }

    /// Issue both an access and a refresh token
    pub fn issue_pair(
        &self,
        user_id: Uuid,
        email: &str,
        username: &str,
    ) -> Result<TokenPair, JwtError> {
        let (access_token, access_expires_at) = self.issue_access(user_id, email, username)?;
        let (refresh_token, refresh_expires_at) = self.issue_refresh(user_id)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
            token_type: "Bearer".to_string(),
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        // Zero leeway for strict expiration checking
        validation.leeway = 0;
        validation
    }

    /// Verify an access token and return its claims
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, JwtError> {
        let data = decode::<AccessClaims>(token, &self.access_decoding, &self.validation())?;
        Ok(data.claims)
    }

    /// Verify a refresh token and return its claims
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        let data = decode::<RefreshClaims>(token, &self.refresh_decoding, &self.validation())?;
        Ok(data.claims)
    }
}
