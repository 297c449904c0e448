//! Raw token extraction from an incoming request.
//!
//! Order of precedence:
//! 1. CORS preflight that announces an `Authorization` header → deferred to the real request
//! 2. custom extractor (if configured)
//! 3. `Authorization: Bearer <token>`

use std::{fmt, sync::Arc};

use axum::http::{HeaderMap, Method, header, request::Parts};
use tower::BoxError;

use crate::error::AuthError;

/// Custom token lookup (cookie, query string, ...). Errors are passed through unclassified.
pub type GetToken = Arc<dyn Fn(&Parts) -> Result<Option<String>, BoxError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// OPTIONS preflight announcing `authorization`; the follow-up request decides.
    Preflight,
    Token(String),
    NoToken,
}

#[derive(Clone, Default)]
pub struct TokenExtractor {
    custom: Option<GetToken>,
}

impl fmt::Debug for TokenExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenExtractor")
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

impl TokenExtractor {
    /// Read the token from the `Authorization` header only.
    pub fn from_header() -> Self {
        Self::default()
    }

    pub fn custom<F>(get_token: F) -> Self
    where
        F: Fn(&Parts) -> Result<Option<String>, BoxError> + Send + Sync + 'static,
    {
        Self {
            custom: Some(Arc::new(get_token)),
        }
    }

    pub fn extract(&self, parts: &Parts) -> Result<Extraction, AuthError> {
        if is_authorization_preflight(parts) {
            return Ok(Extraction::Preflight);
        }

        let token = match &self.custom {
            Some(get_token) => get_token(parts).map_err(AuthError::Extractor)?,
            None => bearer_from_headers(&parts.headers)?,
        };

        // An empty credential counts as no credential at all.
        Ok(match token {
            Some(token) if !token.is_empty() => Extraction::Token(token),
            _ => Extraction::NoToken,
        })
    }
}

/// `OPTIONS` request whose `Access-Control-Request-Headers` lists `authorization`.
pub fn is_authorization_preflight(parts: &Parts) -> bool {
    if parts.method != Method::OPTIONS {
        return false;
    }

    parts
        .headers
        .get_all(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|name| name.trim().eq_ignore_ascii_case("authorization"))
}

/// Parse `Authorization: <scheme> <credentials>`.
///
/// - header absent (or empty) → `Ok(None)`
/// - exactly two space-separated parts with scheme `Bearer` (any case) → `Ok(Some(token))`
/// - anything else → `MalformedAuthorizationHeader`
pub fn bearer_from_headers(headers: &HeaderMap) -> Result<Option<String>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    if value.is_empty() {
        return Ok(None);
    }

    let value = value
        .to_str()
        .map_err(|_| AuthError::MalformedAuthorizationHeader)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(credentials), None) if scheme.eq_ignore_ascii_case("Bearer") => {
            Ok(Some(credentials.to_string()))
        }
        _ => Err(AuthError::MalformedAuthorizationHeader),
    }
}
