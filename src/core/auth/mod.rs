//! Authentication module for VidTube
//!
//! This module provides authentication functionality including:
//! - Password hashing and verification
//! - JWT issuance and validation with separate access/refresh secrets
//! - Refresh-token rotation with reuse detection
//! - REST API endpoints for auth operations

pub mod api;
pub mod jwt;
pub mod password;
pub mod service;

pub use api::{AuthApiState, ChangePasswordRequest, user_api_router};
pub use jwt::{AccessClaims, JwtError, JwtService, RefreshClaims, TokenConfig, TokenPair};
pub use password::PasswordError;
pub use service::{
    AuthError, AuthResponse, AuthService, LoginRequest, RefreshRequest, RegisterRequest,
};
