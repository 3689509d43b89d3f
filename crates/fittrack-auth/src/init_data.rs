//! Telegram `initData` parsing and signing primitives.
//!
//! The credential is a URL-encoded query string. Its signature is
//! `hex(HMAC-SHA256(secret_key, data_check_string))` where
//! `secret_key = HMAC-SHA256("WebAppData", bot_token)` and the data check
//! string is every field except `hash`, sorted by key, rendered as
//! `key=value` and joined with `\n`.

use std::collections::BTreeMap;

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use url::form_urlencoded;

use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Authorization scheme prefix, including the separating space.
pub const SCHEME_PREFIX: &str = "tma ";

/// HMAC key used to derive the per-bot secret key.
pub const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";

/// Maximum credential age accepted, in seconds.
pub const CREDENTIAL_TTL_SECS: i64 = 86_400;

/// Size of a derived secret key.
pub const SECRET_KEY_LEN: usize = 32;

/// Decoded credential fields, ordered by key.
///
/// Keys are `String`s, so ordering is byte-wise over UTF-8, which is the
/// order the data check string needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitData {
    fields: BTreeMap<String, String>,
}

impl InitData {
    /// Decode a raw query string (scheme prefix already stripped).
    ///
    /// A key that appears twice is rejected: a credential with two `hash`
    /// or two `user` fields has no single meaning.
    pub fn parse(raw: &str) -> Result<Self, AuthError> {
        let mut fields = BTreeMap::new();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            if fields.insert(key.into_owned(), value.into_owned()).is_some() {
                return Err(AuthError::MalformedCredential("duplicate field"));
            }
        }
        Ok(Self { fields })
    }

    /// Build from already-decoded pairs. Later duplicates overwrite earlier ones.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.fields.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Remove and return the `hash` field.
    pub fn take_hash(&mut self) -> Option<String> {
        self.fields.remove("hash")
    }

    /// `auth_date` as Unix seconds.
    pub fn auth_date(&self) -> Result<i64, AuthError> {
        self.get("auth_date")
            .ok_or(AuthError::MalformedCredential("missing auth_date"))?
            .parse()
            .map_err(|_| AuthError::MalformedCredential("auth_date is not an integer"))
    }

    /// Sorted `key=value` lines joined by `\n`, no trailing newline.
    ///
    /// Includes every field currently held, so call [`take_hash`](Self::take_hash)
    /// first.
    pub fn data_check_string(&self) -> String {
        self.fields
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Derive the per-bot secret key from the bot token.
pub fn derive_secret_key(bot_token: &str) -> Result<[u8; SECRET_KEY_LEN], InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(WEB_APP_DATA_KEY)?;
    mac.update(bot_token.as_bytes());
    let mut key = [0u8; SECRET_KEY_LEN];
    key.copy_from_slice(&mac.finalize().into_bytes());
    Ok(key)
}

/// Lowercase hex signature of a data check string.
pub fn sign(secret_key: &[u8], data_check_string: &str) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret_key)?;
    mac.update(data_check_string.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Compare two signatures without short-circuiting on the first difference.
pub fn signatures_match(expected: &str, provided: &str) -> bool {
    expected.len() == provided.len()
        && bool::from(expected.as_bytes().ct_eq(provided.as_bytes()))
}
