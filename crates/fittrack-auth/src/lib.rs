//! Telegram Mini App credential verification for fittrack.
//!
//! Every API request carries `Authorization: tma <initData>`, where
//! `initData` is the query string Telegram hands the Mini App at launch.
//! [`InitDataVerifier`] checks its HMAC-SHA256 signature against the bot
//! token and its 24-hour freshness, then yields a [`VerifiedIdentity`].
//!
//! ## Features
//!
//! - `dev-bypass`: [`DevBypassVerifier`], accepting `test-<id>` headers for
//!   local testing
//! - `test-utils`: [`sign_init_data`] for building signed credentials

#[cfg(any(test, feature = "dev-bypass"))]
pub mod dev;
pub mod error;
pub mod identity;
pub mod init_data;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod verifier;

#[cfg(any(test, feature = "dev-bypass"))]
pub use dev::DevBypassVerifier;
pub use error::{AuthError, VerifierConfigError};
pub use identity::VerifiedIdentity;
pub use init_data::{CREDENTIAL_TTL_SECS, InitData, SCHEME_PREFIX};
#[cfg(any(test, feature = "test-utils"))]
pub use testing::sign_init_data;
pub use verifier::{IdentityVerifier, InitDataVerifier};
