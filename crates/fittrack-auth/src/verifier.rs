//! Credential verification.

use zeroize::Zeroizing;

use crate::error::{AuthError, VerifierConfigError};
use crate::identity::VerifiedIdentity;
use crate::init_data::{
    self, CREDENTIAL_TTL_SECS, InitData, SCHEME_PREFIX, SECRET_KEY_LEN, signatures_match,
};

/// Turns an authorization header into a trusted identity.
///
/// Implementations are pure: no I/O, no shared mutable state. `now` is
/// Unix seconds.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, header: &str, now: i64) -> Result<VerifiedIdentity, AuthError>;
}

/// Production verifier for `tma <initData>` headers.
///
/// Holds only the key derived from the bot token, computed once at
/// construction.
#[derive(Clone)]
pub struct InitDataVerifier {
    secret_key: Zeroizing<[u8; SECRET_KEY_LEN]>,
}

impl std::fmt::Debug for InitDataVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitDataVerifier")
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

impl InitDataVerifier {
    /// Build a verifier for the given bot token.
    ///
    /// An empty token is refused so that no verifier can exist without a
    /// secret.
    pub fn new(bot_token: &str) -> Result<Self, VerifierConfigError> {
        if bot_token.trim().is_empty() {
            return Err(VerifierConfigError::MissingBotToken);
        }
        let key = init_data::derive_secret_key(bot_token)
            .map_err(|e| VerifierConfigError::KeyDerivation(e.to_string()))?;
        Ok(Self {
            secret_key: Zeroizing::new(key),
        })
    }

    /// Verify a raw `initData` query string (scheme already stripped).
    ///
    /// Checks run in a fixed order: `hash` presence, signature, freshness,
    /// then the `user` payload. Nothing from the payload is trusted before
    /// the signature check passes.
    pub fn verify_init_data(&self, raw: &str, now: i64) -> Result<VerifiedIdentity, AuthError> {
        let mut data = InitData::parse(raw)?;
        let hash = data
            .take_hash()
            .ok_or(AuthError::MalformedCredential("missing hash"))?;

        // HMAC accepts keys of any length, so a signing error cannot happen;
        // if it ever did, fail closed.
        let expected = init_data::sign(self.secret_key.as_slice(), &data.data_check_string())
            .map_err(|_| AuthError::SignatureMismatch)?;
        if !signatures_match(&expected, &hash) {
            return Err(AuthError::SignatureMismatch);
        }

        let auth_date = data.auth_date()?;
        if now.saturating_sub(auth_date) > CREDENTIAL_TTL_SECS {
            return Err(AuthError::CredentialExpired);
        }

        let user = data
            .get("user")
            .ok_or(AuthError::MalformedCredential("missing user"))?;
        serde_json::from_str(user)
            .map_err(|_| AuthError::MalformedCredential("user is not a valid identity object"))
    }
}

impl IdentityVerifier for InitDataVerifier {
    fn verify(&self, header: &str, now: i64) -> Result<VerifiedIdentity, AuthError> {
        let raw = header
            .strip_prefix(SCHEME_PREFIX)
            .ok_or(AuthError::MissingCredential)?;
        self.verify_init_data(raw, now)
    }
}
