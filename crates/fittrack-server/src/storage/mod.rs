//! SQLite storage for the fittrack server.
//!
//! Only the identity table lives here; everything keyed off it (food logs,
//! measurements) belongs to other services.

mod db;
mod models;
mod queries;


pub use db::ServerDatabase;
pub use fittrack_core::db::DatabaseError;
pub use models::User;
