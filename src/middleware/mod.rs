/*
 * Responsibility
 * - JwtAuth を request flow に差し込む adapter
 *   - access: axum `from_fn_with_state` (rejection → AuthError response)
 *   - layer: tower Layer (rejection → service error, caller translates)
 */
pub mod access;
pub mod layer;
