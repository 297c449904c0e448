/*
 * Responsibility
 * - Authentication failure classification (AuthError / ErrorKind)
 * - IntoResponse implementation (HTTP status / JSON error body / WWW-Authenticate)
 * - Builder-time configuration errors
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tower::BoxError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Classified reason an authentication attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedAuthorizationHeader,
    MissingToken,
    CredentialsResolutionError,
    TokenRevoked,
    InvalidToken,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedAuthorizationHeader => "MALFORMED_AUTHORIZATION_HEADER",
            Self::MissingToken => "MISSING_TOKEN",
            Self::CredentialsResolutionError => "CREDENTIALS_RESOLUTION_ERROR",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::InvalidToken => "INVALID_TOKEN",
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Format is Authorization: Bearer [token]")]
    MalformedAuthorizationHeader,

    #[error("No authorization token was found")]
    MissingToken,

    // Secret resolver or revocation checker failed.
    #[error("failed to resolve credentials: {0}")]
    CredentialsResolution(#[source] BoxError),

    #[error("The token has been revoked.")]
    TokenRevoked,

    #[error("{0}")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    // Custom token extractor failure, passed through as-is.
    #[error("{0}")]
    Extractor(#[source] BoxError),
}

impl AuthError {
    /// `None` for custom extractor failures, which are not classified.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::MalformedAuthorizationHeader => Some(ErrorKind::MalformedAuthorizationHeader),
            Self::MissingToken => Some(ErrorKind::MissingToken),
            Self::CredentialsResolution(_) => Some(ErrorKind::CredentialsResolutionError),
            Self::TokenRevoked => Some(ErrorKind::TokenRevoked),
            Self::InvalidToken(_) => Some(ErrorKind::InvalidToken),
            Self::Extractor(_) => None,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().map(|k| k.code()).unwrap_or("UNAUTHORIZED")
    }

    // RFC 6750 challenge for the response.
    fn challenge(&self) -> &'static str {
        match self.kind() {
            Some(ErrorKind::MalformedAuthorizationHeader) => "Bearer error=\"invalid_request\"",
            Some(ErrorKind::InvalidToken) | Some(ErrorKind::TokenRevoked) => {
                "Bearer error=\"invalid_token\""
            }
            _ => "Bearer",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let challenge = HeaderValue::from_static(self.challenge());

        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code(),
                message: self.to_string(),
            },
        };

        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, challenge)],
            Json(body),
        )
            .into_response()
    }
}

/// Errors raised while building a `JwtAuth`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("secret should be set")]
    MissingSecret,
    #[error("user property must not be empty")]
    EmptyUserProperty,
}
