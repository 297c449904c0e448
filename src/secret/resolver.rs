use std::{fmt, sync::Arc};

use async_trait::async_trait;
use axum::http::request::Parts;
use tower::BoxError;

use crate::JsonMap;
use crate::secret::Secret;
use crate::token::UnverifiedToken;

/// Resolves the secret from the request and the unverified payload.
#[async_trait]
pub trait PayloadOnlyResolver: Send + Sync {
    async fn resolve(&self, parts: &Parts, payload: &JsonMap) -> Result<Secret, BoxError>;
}

/// Resolves the secret from the request, the unverified header (`kid`, `alg`) and payload.
#[async_trait]
pub trait HeaderAndPayloadResolver: Send + Sync {
    async fn resolve(
        &self,
        parts: &Parts,
        header: &JsonMap,
        payload: &JsonMap,
    ) -> Result<Secret, BoxError>;
}

/// How the verification secret is obtained. Chosen once, at configuration time.
#[derive(Clone)]
pub enum SecretSource {
    /// Fixed secret; inputs are ignored.
    Static(Secret),
    PayloadOnly(Arc<dyn PayloadOnlyResolver>),
    HeaderAndPayload(Arc<dyn HeaderAndPayloadResolver>),
}

impl fmt::Debug for SecretSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(secret) => f.debug_tuple("Static").field(secret).finish(),
            Self::PayloadOnly(_) => f.write_str("PayloadOnly(..)"),
            Self::HeaderAndPayload(_) => f.write_str("HeaderAndPayload(..)"),
        }
    }
}

impl SecretSource {
    pub fn fixed(secret: impl Into<Secret>) -> Self {
        Self::Static(secret.into())
    }

    pub fn payload_only(resolver: impl PayloadOnlyResolver + 'static) -> Self {
        Self::PayloadOnly(Arc::new(resolver))
    }

    pub fn header_and_payload(resolver: impl HeaderAndPayloadResolver + 'static) -> Self {
        Self::HeaderAndPayload(Arc::new(resolver))
    }

    /// Invoked exactly once per request that carries a token.
    pub async fn resolve(
        &self,
        parts: &Parts,
        token: &UnverifiedToken,
    ) -> Result<Secret, BoxError> {
        match self {
            Self::Static(secret) => Ok(secret.clone()),
            Self::PayloadOnly(resolver) => resolver.resolve(parts, &token.payload).await,
            Self::HeaderAndPayload(resolver) => {
                resolver.resolve(parts, &token.header, &token.payload).await
            }
        }
    }
}
