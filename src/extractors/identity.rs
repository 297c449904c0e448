use std::{
    collections::{HashMap, hash_map::Entry},
    convert::Infallible,
};

use axum::extract::FromRequestParts;
use axum::http::{Extensions, request::Parts};

use crate::auth::DEFAULT_USER_PROPERTY;
use crate::error::AuthError;
use crate::verify::VerifiedClaims;

/// Verified identities attached to a request, keyed by slot name.
///
/// Several authenticators with different `user_property` values can share one
/// request; each writes its own slot.
#[derive(Debug, Clone, Default)]
pub struct IdentitySlots(HashMap<String, VerifiedClaims>);

impl IdentitySlots {
    pub fn get(&self, slot: &str) -> Option<&VerifiedClaims> {
        self.0.get(slot)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_extensions<'a>(
        extensions: &'a Extensions,
        slot: &str,
    ) -> Option<&'a VerifiedClaims> {
        extensions.get::<IdentitySlots>()?.get(slot)
    }

    /// Each slot is written once per request; an occupied slot keeps its first
    /// identity. Authenticators stacked on one route need distinct `user_property` names.
    pub(crate) fn attach(extensions: &mut Extensions, slot: &str, claims: VerifiedClaims) {
        let Some(slots) = extensions.get_mut::<IdentitySlots>() else {
            extensions.insert(IdentitySlots(HashMap::from([(slot.to_string(), claims)])));
            return;
        };

        match slots.0.entry(slot.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(claims);
            }
            Entry::Occupied(_) => {
                tracing::warn!(slot, "identity slot already set; keeping the first identity");
            }
        }
    }
}

impl<S> FromRequestParts<S> for IdentitySlots
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<IdentitySlots>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Claims from the default `"user"` slot.
/// Missing identity (middleware not applied, or anonymous request) → `AuthError::MissingToken`.
#[derive(Debug, Clone)]
pub struct AuthClaims(pub VerifiedClaims);

impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        IdentitySlots::from_extensions(&parts.extensions, DEFAULT_USER_PROPERTY)
            .cloned()
            .map(AuthClaims)
            .ok_or(AuthError::MissingToken)
    }
}

/// Claims from the default `"user"` slot, if the request was authenticated.
#[derive(Debug, Clone)]
pub struct MaybeAuthClaims(pub Option<VerifiedClaims>);

impl<S> FromRequestParts<S> for MaybeAuthClaims
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthClaims(
            IdentitySlots::from_extensions(&parts.extensions, DEFAULT_USER_PROPERTY).cloned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::JsonMap;

    fn claims(sub: &str) -> VerifiedClaims {
        let mut map = JsonMap::new();
        map.insert("sub".into(), json!(sub));
        VerifiedClaims(map)
    }

    #[test]
    fn an_occupied_slot_keeps_its_first_identity() {
        let mut extensions = Extensions::new();
        IdentitySlots::attach(&mut extensions, "user", claims("alice"));
        IdentitySlots::attach(&mut extensions, "user", claims("mallory"));
        IdentitySlots::attach(&mut extensions, "client", claims("svc-1"));

        let user = IdentitySlots::from_extensions(&extensions, "user").unwrap();
        assert_eq!(user.subject(), Some("alice"));
        let client = IdentitySlots::from_extensions(&extensions, "client").unwrap();
        assert_eq!(client.subject(), Some("svc-1"));
    }
}
