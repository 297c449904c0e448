/*
 * Responsibility
 * - transport 層の middleware (CORS / request-id / trace / timeout)
 * - 認証は bearer_jwt_auth::middleware 側
 */
pub mod cors;
pub mod http;
