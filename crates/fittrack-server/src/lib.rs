//! fittrack API server library
//!
//! - Telegram Mini App authentication (`AuthUser` extractor)
//! - Per-client rate limiting for `/api`
//! - SQLite user identity store
//! - Router assembly

pub mod auth;
pub mod rate_limit;
pub mod routes;
pub mod storage;
