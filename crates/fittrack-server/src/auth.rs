//! Request authentication: verifier wiring, the `AuthUser` extractor and
//! the mapping of verification failures to HTTP responses.

use std::sync::Arc;

use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{debug, warn};

use fittrack_auth::{
    AuthError, IdentityVerifier, InitDataVerifier, VerifiedIdentity, VerifierConfigError,
};
use fittrack_core::Environment;
use fittrack_core::db::unix_timestamp;

use crate::routes::AppState;

/// Choose the verifier for `env`.
///
/// Production always gets the strict [`InitDataVerifier`]. Development gets
/// the `test-<id>` bypass on top of it, but only when built with the
/// `dev-bypass` feature.
pub fn build_verifier(
    bot_token: &str,
    env: Environment,
) -> Result<Arc<dyn IdentityVerifier>, VerifierConfigError> {
    let strict = InitDataVerifier::new(bot_token)?;
    if env.is_production() {
        return Ok(Arc::new(strict));
    }
    Ok(development_verifier(strict))
}

#[cfg(feature = "dev-bypass")]
fn development_verifier(strict: InitDataVerifier) -> Arc<dyn IdentityVerifier> {
    warn!("Development bypass enabled: `test-<id>` authorization headers are trusted");
    Arc::new(fittrack_auth::DevBypassVerifier::new(strict))
}

#[cfg(not(feature = "dev-bypass"))]
fn development_verifier(strict: InitDataVerifier) -> Arc<dyn IdentityVerifier> {
    warn!("Built without `dev-bypass`; development environment uses strict verification");
    Arc::new(strict)
}

/// The verified caller of an authenticated route.
#[derive(Debug, Clone)]
pub struct AuthUser(pub VerifiedIdentity);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // A non-ASCII header cannot carry a tma credential; treat it as absent.
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        match state.verifier.verify(header, unix_timestamp()) {
            Ok(identity) => Ok(Self(identity)),
            Err(err @ AuthError::SignatureMismatch) => {
                warn!(path = %parts.uri.path(), "Rejected credential with invalid signature");
                Err(AuthRejection(err))
            }
            Err(err) => {
                debug!(path = %parts.uri.path(), reason = %err, "Rejected credential");
                Err(AuthRejection(err))
            }
        }
    }
}

/// A verification failure rendered as a JSON error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRejection(pub AuthError);

impl AuthRejection {
    pub const fn status(self) -> StatusCode {
        match self.0 {
            AuthError::SignatureMismatch => StatusCode::FORBIDDEN,
            AuthError::MissingCredential
            | AuthError::MalformedCredential(_)
            | AuthError::CredentialExpired => StatusCode::UNAUTHORIZED,
        }
    }

    pub const fn message(self) -> &'static str {
        match self.0 {
            AuthError::MissingCredential => "Unauthorized: No TMA header",
            AuthError::MalformedCredential(_) => "Unauthorized: Invalid initData",
            AuthError::SignatureMismatch => "Forbidden: Hash mismatch",
            AuthError::CredentialExpired => "Unauthorized: Session expired",
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}
