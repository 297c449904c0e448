//! Bearer authentication as a tower `Layer`.
//!
//! Rejections are returned as the service error (a `BoxError` wrapping
//! `AuthError`); the response is never written here. Translate them with
//! `HandleErrorLayer`:
//!
//! ```ignore
//! let layers = ServiceBuilder::new()
//!     .layer(HandleErrorLayer::new(layer::handle_error))
//!     .layer(JwtAuthLayer::new(auth));
//! let router = router.layer(layers);
//! ```
//!
//! Requests matching an `unless` rule skip authentication entirely:
//!
//! ```ignore
//! JwtAuthLayer::new(auth).unless(|parts| parts.method == Method::OPTIONS);
//! ```

use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    http::{Request, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tower::{BoxError, Layer, Service};

use crate::auth::JwtAuth;
use crate::error::AuthError;
use crate::extractors::IdentitySlots;

/// Exclusion rule: `true` → the request is passed through unauthenticated.
pub type Unless = Arc<dyn Fn(&Parts) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct JwtAuthLayer {
    auth: JwtAuth,
    unless: Option<Unless>,
}

impl JwtAuthLayer {
    pub fn new(auth: JwtAuth) -> Self {
        Self { auth, unless: None }
    }

    /// Skip authentication for requests matching `rule` (method, path, ...).
    pub fn unless<F>(mut self, rule: F) -> Self
    where
        F: Fn(&Parts) -> bool + Send + Sync + 'static,
    {
        self.unless = Some(Arc::new(rule));
        self
    }
}

impl fmt::Debug for JwtAuthLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuthLayer")
            .field("auth", &self.auth)
            .field("unless", &self.unless.is_some())
            .finish()
    }
}

impl<S> Layer<S> for JwtAuthLayer {
    type Service = JwtAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        JwtAuthService {
            inner,
            auth: self.auth.clone(),
            unless: self.unless.clone(),
        }
    }
}

#[derive(Clone)]
pub struct JwtAuthService<S> {
    inner: S,
    auth: JwtAuth,
    unless: Option<Unless>,
}

impl<S: fmt::Debug> fmt::Debug for JwtAuthService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuthService")
            .field("inner", &self.inner)
            .field("auth", &self.auth)
            .field("unless", &self.unless.is_some())
            .finish()
    }
}

impl<S, B> Service<Request<B>> for JwtAuthService<S>
where
    S: Service<Request<B>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        // Take the service that was driven to readiness; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let auth = self.auth.clone();
        let unless = self.unless.clone();

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();

            if unless.as_ref().is_some_and(|rule| rule(&parts)) {
                tracing::debug!(uri = %parts.uri, "excluded from authentication");
                return inner
                    .call(Request::from_parts(parts, body))
                    .await
                    .map_err(Into::into);
            }

            if let Some(claims) = auth.authenticate(&parts).await.into_result()? {
                IdentitySlots::attach(&mut parts.extensions, auth.user_property(), claims);
            }

            inner
                .call(Request::from_parts(parts, body))
                .await
                .map_err(Into::into)
        })
    }
}

/// Default translation for `HandleErrorLayer`: `AuthError` → its response,
/// anything else → 500.
pub async fn handle_error(err: BoxError) -> Response {
    match err.downcast::<AuthError>() {
        Ok(auth_err) => (*auth_err).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "unhandled service error");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
