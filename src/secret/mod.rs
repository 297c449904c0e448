//! Verification key material and the ways to obtain it per request.

pub mod keyset;
pub mod resolver;

use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey};

pub use keyset::{KeyNotFound, KeySet};
pub use resolver::{HeaderAndPayloadResolver, PayloadOnlyResolver, SecretSource};

/// Key material used to verify a token.
///
/// - Key material is not printable via Debug.
#[derive(Clone)]
pub enum Secret {
    /// HMAC shared secret.
    Bytes(Vec<u8>),
    /// RSA / EC / Ed25519 public key in PEM form.
    Pem(String),
    Key(DecodingKey),
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Bytes(_) => "Bytes",
            Self::Pem(_) => "Pem",
            Self::Key(_) => "Key",
        };
        f.debug_tuple("Secret").field(&kind).finish()
    }
}

impl Secret {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    pub fn from_pem(pem: impl Into<String>) -> Self {
        Self::Pem(pem.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bytes(bytes) => bytes.is_empty(),
            Self::Pem(pem) => pem.trim().is_empty(),
            Self::Key(_) => false,
        }
    }

    /// Build the `DecodingKey` for `alg`.
    ///
    /// `alg` must come from the configured allow-list, never from the unverified
    /// token header: the PEM parser is picked from it.
    pub fn decoding_key(
        &self,
        alg: Algorithm,
    ) -> Result<DecodingKey, jsonwebtoken::errors::Error> {
        match self {
            Self::Key(key) => Ok(key.clone()),
            Self::Bytes(bytes) => Ok(DecodingKey::from_secret(bytes)),
            Self::Pem(pem) => match alg {
                Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                    Ok(DecodingKey::from_secret(pem.as_bytes()))
                }
                Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(pem.as_bytes()),
                Algorithm::EdDSA => DecodingKey::from_ed_pem(pem.as_bytes()),
                _ => DecodingKey::from_rsa_pem(pem.as_bytes()),
            },
        }
    }
}

impl From<DecodingKey> for Secret {
    fn from(key: DecodingKey) -> Self {
        Self::Key(key)
    }
}

impl From<Vec<u8>> for Secret {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}
