//! Session tokens issued by this service
//!
//! After a third-party identity has been validated, the service mints its own
//! pair of HS256-signed tokens:
//!
//! - an **access token** (default lifetime 24 hours) presented on every request
//! - a **refresh token** (default lifetime 7 days) exchanged for a new pair
//!
//! Both carry the same [`SessionClaims`] apart from `exp` and `typ`. Tokens are
//! stateless; they stop being valid only by expiring.

mod issuer;
mod verifier;

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

pub use issuer::IssuedTokens;
pub use issuer::SessionTokenIssuer;
pub use verifier::SessionTokenVerifier;

/// Id of a local user account
pub type UserId = u64;

/// Distinguishes access tokens from refresh tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Access => f.write_str("access"),
            TokenType::Refresh => f.write_str("refresh"),
        }
    }
}

/// Claims embedded in both session tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Local user id
    #[serde(rename = "userID")]
    pub user_id: UserId,
    /// Email of the user, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Token type
    pub typ: TokenType,
}
