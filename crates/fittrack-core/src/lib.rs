//! `fittrack` Core Library
//!
//! Shared functionality for `fittrack` components:
//! - Configuration loading with environment overrides
//! - `SQLite` pool helpers and the `define_database!` macro
//! - Tracing initialisation
//! - Common error types

pub mod config;
pub mod db;
pub mod error;
pub mod tracing_init;

pub use config::{Config, Environment};
pub use error::{Error, Result};
