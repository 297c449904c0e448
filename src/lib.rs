//! Bearer-token (JWT) authentication for axum / tower services.
//!
//! The pipeline per request:
//! - pull the raw token out of the request (`token`)
//! - decode it structurally, without trusting anything (`token::unverified`)
//! - resolve the verification secret and check revocation concurrently
//!   (`secret`, `revocation`)
//! - verify signature + standard claims with `jsonwebtoken` (`verify`)
//! - attach the verified claims to the request, or reject (`auth`, `middleware`)
//!
//! ```ignore
//! let auth = JwtAuth::builder(SecretSource::fixed(Secret::from_bytes(secret)))
//!     .credentials_required(true)
//!     .build()?;
//!
//! let api = middleware::access::apply(api::routes(), auth);
//! ```

pub mod auth;
pub mod cache;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod revocation;
pub mod secret;
pub mod token;
pub mod verify;

/// JSON object used for unverified headers/payloads and verified claims.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

pub use auth::{AuthOutcome, DEFAULT_USER_PROPERTY, JwtAuth, JwtAuthBuilder};
pub use error::{AuthError, ConfigError, ErrorKind};
pub use extractors::{AuthClaims, IdentitySlots, MaybeAuthClaims};
pub use middleware::layer::JwtAuthLayer;
pub use revocation::{NeverRevoked, RevocationChecker};
pub use secret::{HeaderAndPayloadResolver, PayloadOnlyResolver, Secret, SecretSource};
pub use token::{TokenExtractor, UnverifiedToken};
pub use verify::{VerifiedClaims, Verifier};
