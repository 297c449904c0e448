use std::collections::HashSet;

use jsonwebtoken::{Algorithm, Validation};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::JsonMap;
use crate::secret::Secret;

/// Trusted token payload. Only produced by a successful [`Verifier::verify`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VerifiedClaims(pub(crate) JsonMap);

impl VerifiedClaims {
    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.0.get(claim)
    }

    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    pub fn as_map(&self) -> &JsonMap {
        &self.0
    }

    pub fn into_inner(self) -> JsonMap {
        self.0
    }

    /// Convert into an application claims type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }
}

/// Signature + standard claim verification, delegated to `jsonwebtoken`.
///
/// `Validation` is passed through untouched: algorithm allow-list, `iss`, `aud`,
/// `exp`/`nbf`, leeway, required claims.
#[derive(Debug, Clone)]
pub struct Verifier {
    validation: Validation,
}

/// Verification options used when none are configured.
///
/// - any HMAC algorithm (HS256 / HS384 / HS512)
/// - no required claims; `exp` and `nbf` are still checked when present
/// - `aud` is not checked
pub fn default_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.required_spec_claims = HashSet::new();
    validation.validate_aud = false;
    validation
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(default_validation())
    }
}

impl Verifier {
    pub fn new(validation: Validation) -> Self {
        Self { validation }
    }

    pub fn validation(&self) -> &Validation {
        &self.validation
    }

    pub fn verify(
        &self,
        token: &str,
        secret: &Secret,
    ) -> Result<VerifiedClaims, jsonwebtoken::errors::Error> {
        // The key family follows the configured allow-list, not the token header.
        let alg = self
            .validation
            .algorithms
            .first()
            .copied()
            .unwrap_or(Algorithm::HS256);
        let key = secret.decoding_key(alg)?;

        let data = jsonwebtoken::decode::<JsonMap>(token, &key, &self.validation)?;
        Ok(VerifiedClaims(data.claims))
    }
}
