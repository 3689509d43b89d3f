//! Development-only verifier that trusts `test-<id>` headers.
//!
//! Compiled only with the `dev-bypass` feature. The server wires it in for
//! the development environment; production always gets the plain
//! [`InitDataVerifier`](crate::InitDataVerifier).

use tracing::debug;

use crate::error::AuthError;
use crate::identity::VerifiedIdentity;
use crate::verifier::IdentityVerifier;

/// Header prefix accepted without a signature.
pub const DEV_PREFIX: &str = "test-";

/// Name given to identities minted from a `test-<id>` header.
pub const DEV_FIRST_NAME: &str = "TestUser";

/// Accepts `test-<integer>` as that user id, delegates everything else.
#[derive(Debug, Clone)]
pub struct DevBypassVerifier<V> {
    inner: V,
}

impl<V: IdentityVerifier> DevBypassVerifier<V> {
    pub const fn new(inner: V) -> Self {
        Self { inner }
    }
}

impl<V: IdentityVerifier> IdentityVerifier for DevBypassVerifier<V> {
    fn verify(&self, header: &str, now: i64) -> Result<VerifiedIdentity, AuthError> {
        if let Some(id) = header
            .strip_prefix(DEV_PREFIX)
            .and_then(|rest| rest.parse::<i64>().ok())
        {
            debug!(user_id = id, "Accepted development identity");
            return Ok(VerifiedIdentity {
                id,
                first_name: DEV_FIRST_NAME.to_string(),
                username: None,
                language_code: None,
            });
        }
        self.inner.verify(header, now)
    }
}
