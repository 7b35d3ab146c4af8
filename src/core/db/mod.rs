//! Database module for VidTube
//!
//! Provides connectivity, models and the user store backed by PostgreSQL
//! via SQLx.

pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used items
pub use models::{CreateUser, User, UserResponse};
pub use pool::{
    DbConfig, DbError, create_pool, create_pool_with_migrations, health_check, run_migrations,
};
pub use repositories::{PgUserStore, StoreError, UserStore, hash_refresh_token};

pub use sqlx::PgPool;
