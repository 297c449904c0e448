use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::request::Parts;
use serde_json::Value;
use tower::BoxError;

use crate::JsonMap;
use crate::secret::{HeaderAndPayloadResolver, Secret};

#[derive(Debug, thiserror::Error)]
#[error("no verification key for kid {0:?}")]
pub struct KeyNotFound(pub Option<String>);

/// Static `kid` → secret table, selected by the unverified header.
///
/// The `kid` only picks the candidate key; the signature check still decides.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, Secret>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, kid: impl Into<String>, secret: Secret) -> Self {
        self.keys.insert(kid.into(), secret);
        self
    }

    pub fn get(&self, kid: &str) -> Option<&Secret> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[async_trait]
impl HeaderAndPayloadResolver for KeySet {
    async fn resolve(
        &self,
        _parts: &Parts,
        header: &JsonMap,
        _payload: &JsonMap,
    ) -> Result<Secret, BoxError> {
        let kid = header.get("kid").and_then(Value::as_str);

        kid.and_then(|kid| self.get(kid))
            .cloned()
            .ok_or_else(|| KeyNotFound(kid.map(str::to_string)).into())
    }
}
