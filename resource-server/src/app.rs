/*
 * Responsibility
 * - Config 読み込み → JwtAuth 生成 → Router 組み立て
 * - Middleware の適用 (CORS / HTTP / Bearer)
 * - axum::serve() で起動
 */
use std::sync::Arc;

use anyhow::Result;
use axum::{Router, routing::get};
use bearer_jwt_auth::{
    JwtAuth, NeverRevoked, RevocationChecker, Secret, SecretSource,
    revocation::{JtiDenylist, ValkeyDenylist},
};
use jsonwebtoken::Validation;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::{Config, KeyMaterial};
use crate::middleware;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set. Ex:
    // RUST_LOG=info,bearer_jwt_auth=debug,tower_http=debug cargo run -p resource-server
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    tracing::info!(
        "starting resource server in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let secret = match &config.auth_key {
        KeyMaterial::Shared(secret) => Secret::from_bytes(secret.as_bytes().to_vec()),
        KeyMaterial::PublicPem(pem) => Secret::from_pem(pem.clone()),
    };
    // Fail at startup rather than on the first request.
    secret.decoding_key(config.auth_algorithm)?;

    let revocation = build_revocation(config).await?;
    let validation = build_validation(config);

    // Same key, same checks; only the policy for missing/invalid tokens differs.
    let auth = JwtAuth::builder(SecretSource::fixed(secret.clone()))
        .shared_revocation(revocation.clone())
        .validation(validation.clone())
        .build()?;
    let optional_auth = JwtAuth::builder(SecretSource::fixed(secret))
        .shared_revocation(revocation)
        .validation(validation)
        .credentials_required(false)
        .build()?;

    Ok(AppState::new(auth, optional_auth))
}

async fn build_revocation(config: &Config) -> Result<Arc<dyn RevocationChecker>> {
    if let Some(url) = &config.revocation_valkey_url {
        let denylist = ValkeyDenylist::new(url).await?;
        tracing::info!("revocation: valkey denylist");
        return Ok(Arc::new(denylist));
    }

    if config.auth_revoked_jtis.is_empty() {
        return Ok(Arc::new(NeverRevoked));
    }

    tracing::info!(
        count = config.auth_revoked_jtis.len(),
        "revocation: static jti denylist"
    );
    Ok(Arc::new(
        config.auth_revoked_jtis.iter().cloned().collect::<JtiDenylist>(),
    ))
}

fn build_validation(config: &Config) -> Validation {
    let mut validation = Validation::new(config.auth_algorithm);
    validation.leeway = config.auth_leeway_seconds;

    if let Some(issuer) = &config.auth_issuer {
        validation.set_issuer(&[issuer]);
    }
    match &config.auth_audience {
        Some(audience) => validation.set_audience(&[audience]),
        // Without a configured audience, `aud` in tokens is not checked.
        None => validation.validate_aud = false,
    }

    validation
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes(&state))
        .with_state(state);

    let router = middleware::http::apply(router, config);
    middleware::cors::apply(router, config)
}
