use std::sync::Arc;

use async_trait::async_trait;
use axum::http::request::Parts;
use tower::BoxError;

use crate::JsonMap;
use crate::cache::{CacheClient, CacheError, ValkeyClient, client::ttl_seconds};
use crate::revocation::{RevocationChecker, jti};

/// Valkey-backed denylist (Redis protocol): `<prefix>:<jti>` present → revoked.
///
/// Backend failures are returned as errors, so the request is rejected
/// (fail-closed).
#[derive(Clone)]
pub struct ValkeyDenylist<C: CacheClient> {
    cache: Arc<C>,
    // Key prefix to avoid collisions across environments
    prefix: String,
}

impl ValkeyDenylist<ValkeyClient> {
    pub async fn new(redis_url: &str) -> Result<Self, CacheError> {
        Self::new_with_prefix(redis_url, "jwt:revoked").await
    }

    pub async fn new_with_prefix(
        redis_url: &str,
        prefix: impl Into<String>,
    ) -> Result<Self, CacheError> {
        let client = ValkeyClient::new(redis_url).await?;
        Ok(Self::new_with_cache(Arc::new(client), prefix))
    }
}

impl<C: CacheClient> ValkeyDenylist<C> {
    pub fn new_with_cache(cache: Arc<C>, prefix: impl Into<String>) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, jti: &str) -> String {
        format!("{}:{}", self.prefix, jti)
    }

    /// Denylist `jti` until the token would have expired anyway.
    ///
    /// Returns `false` when it was already revoked.
    pub async fn revoke(&self, jti: &str, ttl_secs: u64) -> Result<bool, CacheError> {
        self.cache
            .set_if_absent_with_ttl(&self.key(jti), "1", ttl_seconds(ttl_secs))
            .await
    }
}

#[async_trait]
impl<C: CacheClient> RevocationChecker for ValkeyDenylist<C> {
    async fn is_revoked(&self, _parts: &Parts, payload: &JsonMap) -> Result<bool, BoxError> {
        let Some(jti) = jti(payload) else {
            return Ok(false);
        };

        let revoked = self.cache.exists(&self.key(jti)).await.map_err(|err| {
            tracing::warn!(
                error = %err,
                backend = self.cache.backend_name(),
                "revocation lookup failed"
            );
            err
        })?;

        Ok(revoked)
    }
}
