use axum::Json;
use bearer_jwt_auth::MaybeAuthClaims;
use serde_json::{Value, json};

/// GET /api/v1/feed: public, personalised when the caller is authenticated.
pub async fn feed(MaybeAuthClaims(claims): MaybeAuthClaims) -> Json<Value> {
    match claims {
        Some(claims) => Json(json!({
            "authenticated": true,
            "greeting": format!("welcome back, {}", claims.subject().unwrap_or("friend")),
        })),
        None => Json(json!({
            "authenticated": false,
            "greeting": "hello, stranger",
        })),
    }
}
