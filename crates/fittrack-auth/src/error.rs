//! Verification error types.

/// Why a credential was rejected.
///
/// Every variant is terminal for the request. Mapping to a response status
/// is left to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Header absent or not using the `tma` scheme.
    #[error("missing tma credential")]
    MissingCredential,

    /// A required field is absent or unparseable. The reason is for logs only.
    #[error("malformed credential: {0}")]
    MalformedCredential(&'static str),

    /// Computed signature differs from the supplied `hash`.
    #[error("credential signature mismatch")]
    SignatureMismatch,

    /// `auth_date` is older than the credential TTL.
    #[error("credential expired")]
    CredentialExpired,
}

/// Errors building a verifier at startup.
#[derive(Debug, thiserror::Error)]
pub enum VerifierConfigError {
    #[error("bot token is empty")]
    MissingBotToken,

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
}
