/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use bearer_jwt_auth::JwtAuth;

#[derive(Clone, Debug)]
pub struct AppState {
    // credentials required
    pub auth: JwtAuth,
    // anonymous access allowed, identity attached when the token verifies
    pub optional_auth: JwtAuth,
}

impl AppState {
    pub fn new(auth: JwtAuth, optional_auth: JwtAuth) -> Self {
        Self {
            auth,
            optional_auth,
        }
    }
}
