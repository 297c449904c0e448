//! Bearer authentication as an axum middleware function.
//!
//! - success: verified claims go into `IdentitySlots` under `user_property`
//! - anonymous: the request proceeds without identity
//! - rejection: `AuthError` is returned and rendered by its `IntoResponse`

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
};

use crate::auth::JwtAuth;
use crate::error::AuthError;
use crate::extractors::IdentitySlots;

/// Put `auth` in front of every route of `router`.
///
/// Routes that must stay open (health checks, ...) are mounted outside:
/// ```ignore
/// let v1 = middleware::access::apply(api::v1::routes(), auth);
/// let app = Router::new().route("/health", get(health)).nest("/api/v1", v1);
/// ```
pub fn apply<S>(router: Router<S>, auth: JwtAuth) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(auth, jwt_auth))
}

pub async fn jwt_auth(
    State(auth): State<JwtAuth>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let (mut parts, body) = req.into_parts();

    if let Some(claims) = auth.authenticate(&parts).await.into_result()? {
        IdentitySlots::attach(&mut parts.extensions, auth.user_property(), claims);
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}
