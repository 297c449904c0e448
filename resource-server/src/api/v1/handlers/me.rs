use axum::Json;
use bearer_jwt_auth::{AuthClaims, VerifiedClaims};

/// GET /api/v1/me: the verified claims of the caller.
pub async fn me(AuthClaims(claims): AuthClaims) -> Json<VerifiedClaims> {
    Json(claims)
}
