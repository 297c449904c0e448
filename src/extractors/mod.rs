/*!
 * Authenticated identity extractors
 *
 * Responsibility:
 * - middleware が request extensions に格納した VerifiedClaims を handler に渡す
 * - slot 名 (user_property) ごとに 1 つの identity を保持する
 *
 * Public API:
 * - IdentitySlots
 * - AuthClaims / MaybeAuthClaims (default slot)
 */

mod identity;

pub use identity::{AuthClaims, IdentitySlots, MaybeAuthClaims};
