use crate::claims::VerifiedClaims;
use crate::error::ClaimsError;
use crate::identity::NormalizedIdentity;
use crate::identity::ProviderKind;

/// Trait for extracting a normalized identity from validated JWT claims
///
/// This is the provider-specific last step of the [`JwtProvider`](crate::JwtProvider)
/// pipeline. It is only called after the signature, issuer, audience and expiry
/// of the token have been checked, so implementations only decide which claims
/// make up the identity.
pub trait IdentityExtractor: Send + Sync {
    /// The provider whose tokens this extractor understands
    fn provider(&self) -> ProviderKind;

    /// Extract identity information from validated claims
    fn extract_identity(&self, claims: &VerifiedClaims) -> Result<NormalizedIdentity, ClaimsError>;
}

/// Extractor for Google ID tokens
///
/// The stable `sub` claim becomes the external id; `email` is carried over when present.
#[derive(Clone, Debug, Default)]
pub struct GoogleExtractor;

impl IdentityExtractor for GoogleExtractor {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn extract_identity(&self, claims: &VerifiedClaims) -> Result<NormalizedIdentity, ClaimsError> {
        let sub = claims.sub().ok_or(ClaimsError::MissingClaim("sub"))?;
        NormalizedIdentity::new(sub, claims.email().map(str::to_string), ProviderKind::Google)
    }
}
