use std::collections::HashSet;

use async_trait::async_trait;
use axum::http::request::Parts;
use tower::BoxError;

use crate::JsonMap;
use crate::revocation::{RevocationChecker, jti};

/// Fixed, in-memory set of revoked `jti` values.
#[derive(Debug, Clone, Default)]
pub struct JtiDenylist {
    revoked: HashSet<String>,
}

impl JtiDenylist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, jti: &str) -> bool {
        self.revoked.contains(jti)
    }

    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for JtiDenylist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            revoked: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl RevocationChecker for JtiDenylist {
    async fn is_revoked(&self, _parts: &Parts, payload: &JsonMap) -> Result<bool, BoxError> {
        Ok(jti(payload).is_some_and(|jti| self.contains(jti)))
    }
}
