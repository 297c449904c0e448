/*
 * Responsibility
 * - 署名検証とは独立に「この token は失効済みか」を判定する
 * - 既定実装 (NeverRevoked) は何も見ずに false を返す
 * - jti ベースの denylist (in-memory / Valkey)
 */
pub mod denylist;
pub mod valkey;

use async_trait::async_trait;
use axum::http::request::Parts;
use serde_json::Value;
use tower::BoxError;

use crate::JsonMap;

pub use denylist::JtiDenylist;
pub use valkey::ValkeyDenylist;

/// Decides whether a token must be rejected regardless of its signature.
///
/// Runs concurrently with secret resolution, exactly once per request carrying
/// a token. `payload` is unverified.
#[async_trait]
pub trait RevocationChecker: Send + Sync {
    async fn is_revoked(&self, parts: &Parts, payload: &JsonMap) -> Result<bool, BoxError>;
}

/// Default checker: nothing is ever revoked.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRevoked;

#[async_trait]
impl RevocationChecker for NeverRevoked {
    async fn is_revoked(&self, _parts: &Parts, _payload: &JsonMap) -> Result<bool, BoxError> {
        Ok(false)
    }
}

// Tokens without a string `jti` cannot be denylisted.
pub(crate) fn jti(payload: &JsonMap) -> Option<&str> {
    payload.get("jti").and_then(Value::as_str)
}
