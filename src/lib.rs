//! VidTube - Video Platform Backend
//!
//! Backend service for a video hosting platform. Provides user accounts with
//! credential verification and a rotating refresh-token session lifecycle,
//! built with Axum and SQLx.

pub mod core;
