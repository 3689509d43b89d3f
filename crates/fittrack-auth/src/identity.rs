//! The identity a verified credential vouches for.

use serde::{Deserialize, Serialize};

/// A Telegram user whose credential passed verification.
///
/// Deserialized straight from the credential's `user` JSON; unknown fields
/// such as `last_name` or `is_premium` are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub id: i64,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}
