/*!
 * Token discovery
 *
 * Responsibility:
 * - request から raw token を取り出す (extract)
 * - raw token を検証なしで分解する (unverified)
 */

pub mod extract;
pub mod unverified;

pub use extract::{
    Extraction, GetToken, TokenExtractor, bearer_from_headers, is_authorization_preflight,
};
pub use unverified::UnverifiedToken;
