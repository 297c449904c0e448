//! Authentication decision pipeline.
//!
//! ```text
//! Start → ExtractingToken ─┬─ NoToken ──→ Anonymous | Rejected(MissingToken)
//!                          └─ HasToken → ResolvingConcurrently ─┬─ Rejected
//!                                                               └─ Verifying → Authenticated | Anonymous | Rejected
//! ```
//!
//! Nothing is retried; every failure is final for the current request.

use std::{fmt, sync::Arc};

use axum::http::request::Parts;
use jsonwebtoken::Validation;
use tower::BoxError;
use tracing::{debug, warn};

use crate::error::{AuthError, ConfigError};
use crate::revocation::{NeverRevoked, RevocationChecker};
use crate::secret::SecretSource;
use crate::token::{Extraction, TokenExtractor, UnverifiedToken};
use crate::verify::{VerifiedClaims, Verifier, default_validation};

/// Default identity slot name.
pub const DEFAULT_USER_PROPERTY: &str = "user";

/// Terminal decision for one request.
#[derive(Debug)]
pub enum AuthOutcome {
    Authenticated(VerifiedClaims),
    /// No identity attached; the request proceeds.
    Anonymous,
    Rejected(AuthError),
}

impl AuthOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn into_result(self) -> Result<Option<VerifiedClaims>, AuthError> {
        match self {
            Self::Authenticated(claims) => Ok(Some(claims)),
            Self::Anonymous => Ok(None),
            Self::Rejected(err) => Err(err),
        }
    }
}

impl From<Result<Option<VerifiedClaims>, AuthError>> for AuthOutcome {
    fn from(result: Result<Option<VerifiedClaims>, AuthError>) -> Self {
        match result {
            Ok(Some(claims)) => Self::Authenticated(claims),
            Ok(None) => Self::Anonymous,
            Err(err) => Self::Rejected(err),
        }
    }
}

/// Configured bearer-token authenticator.
///
/// Immutable and cheap to clone; one instance serves all requests.
#[derive(Clone)]
pub struct JwtAuth {
    inner: Arc<Inner>,
}

struct Inner {
    secret: SecretSource,
    revocation: Arc<dyn RevocationChecker>,
    extractor: TokenExtractor,
    verifier: Verifier,
    user_property: String,
    credentials_required: bool,
}

impl fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("JwtAuth")
            .field("extractor", &self.inner.extractor)
            .field("verifier", &self.inner.verifier)
            .field("user_property", &self.inner.user_property)
            .field("credentials_required", &self.inner.credentials_required)
            .finish()
    }
}

impl JwtAuth {
    pub fn builder(secret: SecretSource) -> JwtAuthBuilder {
        JwtAuthBuilder::new(secret)
    }

    pub fn user_property(&self) -> &str {
        &self.inner.user_property
    }

    pub fn credentials_required(&self) -> bool {
        self.inner.credentials_required
    }

    pub async fn authenticate(&self, parts: &Parts) -> AuthOutcome {
        self.decide(parts).await.into()
    }

    async fn decide(&self, parts: &Parts) -> Result<Option<VerifiedClaims>, AuthError> {
        let token = match self.inner.extractor.extract(parts)? {
            Extraction::Preflight => {
                debug!(uri = %parts.uri, "cors preflight; authentication deferred");
                return Ok(None);
            }
            Extraction::NoToken if self.inner.credentials_required => {
                return Err(AuthError::MissingToken);
            }
            Extraction::NoToken => return Ok(None),
            Extraction::Token(token) => token,
        };

        // Hints only: nothing in here is trusted until verification succeeds.
        let unverified = UnverifiedToken::decode(&token);

        let (secret, revoked) = tokio::try_join!(
            self.inner.secret.resolve(parts, &unverified),
            self.inner.revocation.is_revoked(parts, &unverified.payload),
        )
        .map_err(|err: BoxError| {
            warn!(error = %err, "credential resolution failed");
            AuthError::CredentialsResolution(err)
        })?;

        if revoked {
            warn!(jti = ?unverified.payload.get("jti"), "revoked token presented");
            return Err(AuthError::TokenRevoked);
        }

        match self.inner.verifier.verify(&token, &secret) {
            Ok(claims) => Ok(Some(claims)),
            Err(err) if self.inner.credentials_required => Err(AuthError::InvalidToken(err)),
            Err(err) => {
                debug!(error = %err, "token verification failed; continuing anonymously");
                Ok(None)
            }
        }
    }
}

pub struct JwtAuthBuilder {
    secret: SecretSource,
    revocation: Arc<dyn RevocationChecker>,
    extractor: TokenExtractor,
    validation: Validation,
    user_property: String,
    credentials_required: bool,
}

impl JwtAuthBuilder {
    fn new(secret: SecretSource) -> Self {
        Self {
            secret,
            revocation: Arc::new(NeverRevoked),
            extractor: TokenExtractor::from_header(),
            validation: default_validation(),
            user_property: DEFAULT_USER_PROPERTY.to_string(),
            credentials_required: true,
        }
    }

    pub fn revocation(self, checker: impl RevocationChecker + 'static) -> Self {
        self.shared_revocation(Arc::new(checker))
    }

    pub fn shared_revocation(mut self, checker: Arc<dyn RevocationChecker>) -> Self {
        self.revocation = checker;
        self
    }

    /// Replace `Authorization` header parsing with a custom lookup.
    pub fn token_extractor<F>(mut self, get_token: F) -> Self
    where
        F: Fn(&Parts) -> Result<Option<String>, BoxError> + Send + Sync + 'static,
    {
        self.extractor = TokenExtractor::custom(get_token);
        self
    }

    pub fn user_property(mut self, name: impl Into<String>) -> Self {
        self.user_property = name.into();
        self
    }

    pub fn credentials_required(mut self, required: bool) -> Self {
        self.credentials_required = required;
        self
    }

    /// Verification options forwarded to `jsonwebtoken`.
    pub fn validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    pub fn build(self) -> Result<JwtAuth, ConfigError> {
        if let SecretSource::Static(secret) = &self.secret {
            if secret.is_empty() {
                return Err(ConfigError::MissingSecret);
            }
        }
        if self.user_property.trim().is_empty() {
            return Err(ConfigError::EmptyUserProperty);
        }

        Ok(JwtAuth {
            inner: Arc::new(Inner {
                secret: self.secret,
                revocation: self.revocation,
                extractor: self.extractor,
                verifier: Verifier::new(self.validation),
                user_property: self.user_property,
                credentials_required: self.credentials_required,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use axum::http::{Method, Request};
    use jsonwebtoken::{Algorithm, EncodingKey, Header};
    use serde_json::{Value, json};
    use tokio::sync::Barrier;

    use crate::JsonMap;
    use crate::error::ErrorKind;
    use crate::secret::{HeaderAndPayloadResolver, PayloadOnlyResolver, Secret};

    const SECRET: &[u8] = b"pipeline-test-secret";

    fn sign_with(header: Header, claims: &Value, key: &[u8]) -> String {
        jsonwebtoken::encode(&header, claims, &EncodingKey::from_secret(key)).unwrap()
    }

    fn sign(claims: &Value) -> String {
        sign_with(Header::new(Algorithm::HS256), claims, SECRET)
    }

    fn claims() -> Value {
        json!({
            "sub": "alice",
            "jti": "t-1",
            "exp": chrono::Utc::now().timestamp() + 600,
        })
    }

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/resource");
        if let Some(value) = value {
            builder = builder.header("authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn fixed() -> SecretSource {
        SecretSource::fixed(Secret::from_bytes(SECRET.to_vec()))
    }

    fn kind(outcome: AuthOutcome) -> Option<ErrorKind> {
        match outcome {
            AuthOutcome::Rejected(err) => err.kind(),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    struct AlwaysRevoked;

    #[async_trait]
    impl RevocationChecker for AlwaysRevoked {
        async fn is_revoked(&self, _: &Parts, _: &JsonMap) -> Result<bool, BoxError> {
            Ok(true)
        }
    }

    struct FailingChecker;

    #[async_trait]
    impl RevocationChecker for FailingChecker {
        async fn is_revoked(&self, _: &Parts, _: &JsonMap) -> Result<bool, BoxError> {
            Err("denylist unavailable".into())
        }
    }

    #[derive(Default)]
    struct RecordingResolver {
        calls: AtomicUsize,
        seen_header: Mutex<Option<JsonMap>>,
    }

    #[async_trait]
    impl HeaderAndPayloadResolver for Arc<RecordingResolver> {
        async fn resolve(
            &self,
            _: &Parts,
            header: &JsonMap,
            _: &JsonMap,
        ) -> Result<Secret, BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_header.lock().unwrap() = Some(header.clone());
            Ok(Secret::from_bytes(SECRET.to_vec()))
        }
    }

    struct SubjectResolver {
        seen_sub: Mutex<Option<String>>,
    }

    #[async_trait]
    impl PayloadOnlyResolver for Arc<SubjectResolver> {
        async fn resolve(&self, _: &Parts, payload: &JsonMap) -> Result<Secret, BoxError> {
            *self.seen_sub.lock().unwrap() =
                payload.get("sub").and_then(Value::as_str).map(str::to_string);
            Ok(Secret::from_bytes(SECRET.to_vec()))
        }
    }

    struct BrokenResolver;

    #[async_trait]
    impl PayloadOnlyResolver for BrokenResolver {
        async fn resolve(&self, _: &Parts, _: &JsonMap) -> Result<Secret, BoxError> {
            Err("key service timed out".into())
        }
    }

    #[tokio::test]
    async fn valid_token_is_authenticated() {
        let auth = JwtAuth::builder(fixed()).build().unwrap();
        let token = sign(&claims());

        let outcome = auth
            .authenticate(&parts_with_auth(Some(&format!("Bearer {token}"))))
            .await;
        match outcome {
            AuthOutcome::Authenticated(verified) => {
                assert_eq!(verified.as_map(), claims().as_object().unwrap());
            }
            other => panic!("expected authenticated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_token_depends_on_credentials_required() {
        let required = JwtAuth::builder(fixed()).build().unwrap();
        assert_eq!(
            kind(required.authenticate(&parts_with_auth(None)).await),
            Some(ErrorKind::MissingToken)
        );

        let optional = JwtAuth::builder(fixed())
            .credentials_required(false)
            .build()
            .unwrap();
        assert!(matches!(
            optional.authenticate(&parts_with_auth(None)).await,
            AuthOutcome::Anonymous
        ));
    }

    #[tokio::test]
    async fn malformed_header_is_fatal_even_when_optional() {
        let optional = JwtAuth::builder(fixed())
            .credentials_required(false)
            .build()
            .unwrap();
        assert_eq!(
            kind(optional.authenticate(&parts_with_auth(Some("Token abc"))).await),
            Some(ErrorKind::MalformedAuthorizationHeader)
        );
    }

    #[tokio::test]
    async fn revoked_token_is_rejected_whatever_the_secret() {
        // Wrong secret: the revocation decision must win over verification.
        let auth = JwtAuth::builder(SecretSource::fixed(Secret::from_bytes(b"wrong".to_vec())))
            .revocation(AlwaysRevoked)
            .credentials_required(false)
            .build()
            .unwrap();
        let token = sign(&claims());

        assert_eq!(
            kind(auth.authenticate(&parts_with_auth(Some(&format!("Bearer {token}")))).await),
            Some(ErrorKind::TokenRevoked)
        );
    }

    #[tokio::test]
    async fn resolver_and_checker_failures_are_credentials_errors() {
        let token = sign(&claims());
        let parts = parts_with_auth(Some(&format!("Bearer {token}")));

        let broken_resolver = JwtAuth::builder(SecretSource::payload_only(BrokenResolver))
            .build()
            .unwrap();
        match broken_resolver.authenticate(&parts).await {
            AuthOutcome::Rejected(AuthError::CredentialsResolution(err)) => {
                assert_eq!(err.to_string(), "key service timed out");
            }
            other => panic!("expected credentials error, got {other:?}"),
        }

        let broken_checker = JwtAuth::builder(fixed())
            .revocation(FailingChecker)
            .credentials_required(false)
            .build()
            .unwrap();
        assert_eq!(
            kind(broken_checker.authenticate(&parts).await),
            Some(ErrorKind::CredentialsResolutionError)
        );
    }

    #[tokio::test]
    async fn header_resolver_receives_unverified_header_once() {
        let resolver = Arc::new(RecordingResolver::default());
        let auth = JwtAuth::builder(SecretSource::header_and_payload(resolver.clone()))
            .build()
            .unwrap();

        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some("2024-06".into());
        let token = sign_with(header, &claims(), SECRET);

        let outcome = auth
            .authenticate(&parts_with_auth(Some(&format!("Bearer {token}"))))
            .await;
        assert!(outcome.is_authenticated());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);

        let seen = resolver.seen_header.lock().unwrap().clone().unwrap();
        assert_eq!(seen.get("kid"), Some(&json!("2024-06")));
        assert_eq!(seen.get("alg"), Some(&json!("HS256")));
    }

    #[tokio::test]
    async fn payload_resolver_receives_unverified_payload() {
        let resolver = Arc::new(SubjectResolver {
            seen_sub: Mutex::new(None),
        });
        let auth = JwtAuth::builder(SecretSource::payload_only(resolver.clone()))
            .build()
            .unwrap();
        let token = sign(&claims());

        let outcome = auth
            .authenticate(&parts_with_auth(Some(&format!("Bearer {token}"))))
            .await;
        assert!(outcome.is_authenticated());
        assert_eq!(resolver.seen_sub.lock().unwrap().as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn failed_verification_degrades_when_optional() {
        let forged = sign_with(Header::new(Algorithm::HS256), &claims(), b"attacker");
        let parts = parts_with_auth(Some(&format!("Bearer {forged}")));

        let required = JwtAuth::builder(fixed()).build().unwrap();
        assert_eq!(
            kind(required.authenticate(&parts).await),
            Some(ErrorKind::InvalidToken)
        );

        let optional = JwtAuth::builder(fixed())
            .credentials_required(false)
            .build()
            .unwrap();
        assert!(matches!(
            optional.authenticate(&parts).await,
            AuthOutcome::Anonymous
        ));
    }

    #[tokio::test]
    async fn default_options_accept_tokens_without_exp_or_signed_hs384() {
        let auth = JwtAuth::builder(fixed()).build().unwrap();
        let no_exp = sign(&json!({"sub": "alice"}));
        let hs384 = sign_with(Header::new(Algorithm::HS384), &claims(), SECRET);

        for token in [no_exp, hs384] {
            let outcome = auth
                .authenticate(&parts_with_auth(Some(&format!("Bearer {token}"))))
                .await;
            assert!(outcome.is_authenticated(), "{outcome:?}");
        }
    }

    // Both sides wait for each other: only completes when polled together.
    struct RendezvousResolver(Arc<Barrier>);

    #[async_trait]
    impl PayloadOnlyResolver for RendezvousResolver {
        async fn resolve(&self, _: &Parts, _: &JsonMap) -> Result<Secret, BoxError> {
            self.0.wait().await;
            Ok(Secret::from_bytes(SECRET.to_vec()))
        }
    }

    struct RendezvousChecker(Arc<Barrier>);

    #[async_trait]
    impl RevocationChecker for RendezvousChecker {
        async fn is_revoked(&self, _: &Parts, _: &JsonMap) -> Result<bool, BoxError> {
            self.0.wait().await;
            Ok(false)
        }
    }

    #[tokio::test]
    async fn resolver_and_checker_run_concurrently() {
        let barrier = Arc::new(Barrier::new(2));
        let resolver = RendezvousResolver(barrier.clone());
        let auth = JwtAuth::builder(SecretSource::payload_only(resolver))
            .revocation(RendezvousChecker(barrier))
            .build()
            .unwrap();
        let token = sign(&claims());
        let parts = parts_with_auth(Some(&format!("Bearer {token}")));

        let outcome = tokio::time::timeout(Duration::from_secs(2), auth.authenticate(&parts))
            .await
            .expect("resolver and checker were not polled together");
        assert!(outcome.is_authenticated());
    }

    #[tokio::test]
    async fn simultaneous_failures_surface_a_single_error() {
        let auth = JwtAuth::builder(SecretSource::payload_only(BrokenResolver))
            .revocation(FailingChecker)
            .build()
            .unwrap();
        let token = sign(&claims());

        match auth
            .authenticate(&parts_with_auth(Some(&format!("Bearer {token}"))))
            .await
        {
            AuthOutcome::Rejected(AuthError::CredentialsResolution(err)) => {
                let message = err.to_string();
                assert!(
                    message == "key service timed out" || message == "denylist unavailable",
                    "{message}"
                );
            }
            other => panic!("expected one credentials error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_token_still_reaches_verification() {
        let auth = JwtAuth::builder(fixed()).build().unwrap();
        assert_eq!(
            kind(auth.authenticate(&parts_with_auth(Some("Bearer not-a-jwt"))).await),
            Some(ErrorKind::InvalidToken)
        );
    }

    #[tokio::test]
    async fn preflight_skips_the_pipeline() {
        let auth = JwtAuth::builder(SecretSource::payload_only(BrokenResolver))
            .build()
            .unwrap();
        let parts = Request::builder()
            .method(Method::OPTIONS)
            .uri("/resource")
            .header("access-control-request-headers", "authorization")
            .header("authorization", "Nonsense")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        assert!(matches!(
            auth.authenticate(&parts).await,
            AuthOutcome::Anonymous
        ));
    }

    #[test]
    fn empty_static_secret_is_a_config_error() {
        let err = JwtAuth::builder(SecretSource::fixed(Secret::from_bytes(Vec::<u8>::new())))
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "secret should be set");

        let err = JwtAuth::builder(fixed()).user_property(" ").build().unwrap_err();
        assert!(matches!(err, ConfigError::EmptyUserProperty));
    }
}
