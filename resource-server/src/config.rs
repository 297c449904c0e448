/*
 * Responsibility
 * - 環境変数の読み込み (PORT, CORS 許可、JWT 検証設定、revocation backend)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use jsonwebtoken::Algorithm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Where the verification key comes from.
#[derive(Clone)]
pub enum KeyMaterial {
    // AUTH_SECRET (HMAC)
    Shared(String),
    // AUTH_PUBLIC_KEY_PEM (RSA / EC / Ed25519)
    PublicPem(String),
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        match self {
            Self::Shared(_) => f.write_str("Shared(..)"),
            Self::PublicPem(_) => f.write_str("PublicPem(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout_seconds: u64,

    pub auth_key: KeyMaterial,
    pub auth_algorithm: Algorithm,
    pub auth_issuer: Option<String>,
    pub auth_audience: Option<String>,
    pub auth_leeway_seconds: u64,

    // Static denylist, used when no Valkey URL is configured.
    pub auth_revoked_jtis: Vec<String>,
    pub revocation_valkey_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = csv("CORS_ALLOWED_ORIGINS");

        let request_timeout_seconds = std::env::var("REQUEST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        // A public key wins over a shared secret when both are set.
        let auth_key = match (
            optional("AUTH_PUBLIC_KEY_PEM").map(|pem| pem.replace("\\n", "\n")),
            optional("AUTH_SECRET"),
        ) {
            (Some(pem), _) => KeyMaterial::PublicPem(pem),
            (None, Some(secret)) => KeyMaterial::Shared(secret),
            (None, None) => return Err(ConfigError::Missing("AUTH_SECRET")),
        };

        let auth_algorithm = match optional("AUTH_ALGORITHM") {
            Some(alg) => {
                Algorithm::from_str(&alg).map_err(|_| ConfigError::Invalid("AUTH_ALGORITHM"))?
            }
            None if matches!(auth_key, KeyMaterial::PublicPem(_)) => Algorithm::RS256,
            None => Algorithm::HS256,
        };

        let auth_leeway_seconds = std::env::var("AUTH_LEEWAY_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            request_timeout_seconds,
            auth_key,
            auth_algorithm,
            auth_issuer: optional("AUTH_ISSUER"),
            auth_audience: optional("AUTH_AUDIENCE"),
            auth_leeway_seconds,
            auth_revoked_jtis: csv("AUTH_REVOKED_JTIS"),
            revocation_valkey_url: optional("REVOCATION_VALKEY_URL"),
        })
    }
}

// Unset and blank are the same thing.
fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn csv(key: &str) -> Vec<String> {
    std::env::var(key)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
