/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - 認証が必須な範囲 (/me) と任意な範囲 (/feed) をここで分ける
 */
use axum::{Router, error_handling::HandleErrorLayer, routing::get};
use bearer_jwt_auth::{
    JwtAuthLayer,
    middleware::{access, layer},
};
use tower::ServiceBuilder;

use crate::api::v1::handlers::{feed::feed, me::me};
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let required = access::apply(Router::new().route("/me", get(me)), state.auth.clone());

    // Optional auth: malformed headers and revoked tokens still fail, through the tower layer.
    let optional = Router::new().route("/feed", get(feed)).layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(layer::handle_error))
            .layer(JwtAuthLayer::new(state.optional_auth.clone())),
    );

    Router::new().merge(required).merge(optional)
}
