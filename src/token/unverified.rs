use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::Value;

use crate::JsonMap;

/// Structural decoding of a compact JWS, WITHOUT signature validation.
///
/// Only used to hand hints (`kid`, `alg`, `jti`, ...) to secret resolvers and
/// revocation checkers. Nothing read from here is authenticated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnverifiedToken {
    pub header: JsonMap,
    pub payload: JsonMap,
    pub signature: Vec<u8>,
}

impl UnverifiedToken {
    /// Decode, falling back to empty maps when the token is not a well-formed JWS.
    /// Verification rejects such tokens later.
    pub fn decode(raw: &str) -> Self {
        Self::try_decode(raw).unwrap_or_default()
    }

    pub fn try_decode(raw: &str) -> Option<Self> {
        let mut segments = raw.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return None;
        };

        Some(Self {
            header: decode_object(header)?,
            payload: decode_object(payload)?,
            signature: URL_SAFE_NO_PAD.decode(signature).ok()?,
        })
    }

    pub fn kid(&self) -> Option<&str> {
        self.header.get("kid").and_then(Value::as_str)
    }

    pub fn alg(&self) -> Option<&str> {
        self.header.get("alg").and_then(Value::as_str)
    }
}

fn decode_object(segment: &str) -> Option<JsonMap> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    serde_json::from_slice(&bytes).ok()
}
