//! Data-access repositories
//!
//! Repositories encapsulate persistence logic behind traits the business
//! logic consumes, keeping SQL out of the service layer.

pub mod user;

pub use user::{PgUserStore, StoreError, UserStore, hash_refresh_token};
