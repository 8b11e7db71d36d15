//! # Federauth
//!
//! Session token issuance and federated identity verification for an API.
//!
//! A client signs in with a token from an external identity provider. This crate
//! checks that token and turns it into a provider-agnostic [`NormalizedIdentity`],
//! then mints the service's own session tokens for the local user.
//!
//! ## Features
//!
//! - Polymorphic identity providers behind one [`IdentityProvider`] trait
//!   - Google-style signed ID tokens: key set fetch, signature verification,
//!     issuer/audience/expiry validation
//!   - Kakao-style opaque tokens: provider introspection with application id check
//!   - Google authorization code exchange for web sign-in
//! - Key set caching per provider with TTL, single-flight refresh and a forced
//!   refresh when a token names an unknown key id
//! - Algorithm family pinning against algorithm confusion
//! - HS256 access/refresh session tokens with atomic verify-and-extract
//! - AES-256-GCM sealing of small payloads
//!
//! ## Example
//!
//! ```rust,no_run
//! use federauth::providers::google::GoogleProvider;
//! use federauth::{SessionConfig, SessionTokenIssuer, SessionTokenVerifier};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let google = GoogleProvider::with_client_ids(vec![
//!         "1234-ios.apps.googleusercontent.com".to_string(),
//!         "1234-android.apps.googleusercontent.com".to_string(),
//!     ])?;
//!
//!     let identity = google.verify("eyJhbGciOiJSUzI1NiIsImtpZCI6Ii4uLiJ9...").await?;
//!     println!("Google user {}", identity.external_id());
//!
//!     // Look up or create the local user for this identity, then:
//!     let session = SessionConfig::new("change-me");
//!     let issuer = SessionTokenIssuer::new(&session);
//!     let tokens = issuer.issue(42, identity.email())?;
//!
//!     let verifier = SessionTokenVerifier::new(&session);
//!     let (user_id, email) = verifier.parse(&tokens.access_token)?;
//!     println!("User {user_id} ({email:?})");
//!
//!     Ok(())
//! }
//! ```

mod cipher;
mod claims;
mod config;
mod error;
mod extractor;
mod identity;
mod jwks_cache;
mod key_set;
mod session;
mod signature;
mod verifier;

pub mod providers;

// Re-exports for public API
pub use cipher::PayloadCipher;
pub use claims::ClaimsValidator;
pub use claims::VerifiedClaims;
pub use config::CodeExchangeConfig;
pub use config::IntrospectionConfig;
pub use config::SessionConfig;
pub use config::TrustConfig;
pub use error::CipherError;
pub use error::ClaimsError;
pub use error::Error;
pub use error::ErrorKind;
pub use error::FederationError;
pub use error::KeyFetchCause;
pub use error::KeyFetchError;
pub use error::Result;
pub use error::SignatureError;
pub use error::TokenIssueError;
pub use error::TokenParseError;
pub use error::TokenVerifyError;
pub use extractor::GoogleExtractor;
pub use extractor::IdentityExtractor;
pub use identity::IdentityAssertion;
pub use identity::NormalizedIdentity;
pub use identity::ProviderKind;
pub use identity::UnknownProvider;
pub use jwks_cache::KeySetCache;
pub use key_set::KeySet;
pub use key_set::KeySetFetcher;
pub use providers::IdentityProvider;
pub use providers::ProviderRegistry;
pub use session::IssuedTokens;
pub use session::SessionClaims;
pub use session::SessionTokenIssuer;
pub use session::SessionTokenVerifier;
pub use session::TokenType;
pub use session::UserId;
pub use signature::AlgorithmFamily;
pub use signature::ResolveKey;
pub use signature::SignatureVerifier;
pub use verifier::JwtProvider;
