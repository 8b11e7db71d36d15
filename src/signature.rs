use jsonwebtoken::decode;
use jsonwebtoken::decode_header;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::Validation;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;

use crate::claims::VerifiedClaims;
use crate::error::SignatureError;

/// Group of signature algorithms that share one key type
///
/// A provider is configured with exactly one family. Tokens whose header names
/// an algorithm outside of it are rejected before any key is looked up, so a
/// token cannot pick e.g. `HS256` to get a public RSA key used as an HMAC secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmFamily {
    /// RSASSA-PKCS1-v1_5 (`RS256`, `RS384`, `RS512`)
    Rsa,
    /// RSASSA-PSS (`PS256`, `PS384`, `PS512`)
    RsaPss,
    /// ECDSA (`ES256`, `ES384`)
    EllipticCurve,
    /// Edwards curve (`EdDSA`)
    EdDsa,
    /// HMAC with a shared secret (`HS256`, `HS384`, `HS512`)
    Hmac,
}

impl AlgorithmFamily {
    pub fn algorithms(&self) -> &'static [Algorithm] {
        match self {
            AlgorithmFamily::Rsa => &[Algorithm::RS256, Algorithm::RS384, Algorithm::RS512],
            AlgorithmFamily::RsaPss => &[Algorithm::PS256, Algorithm::PS384, Algorithm::PS512],
            AlgorithmFamily::EllipticCurve => &[Algorithm::ES256, Algorithm::ES384],
            AlgorithmFamily::EdDsa => &[Algorithm::EdDSA],
            AlgorithmFamily::Hmac => &[Algorithm::HS256, Algorithm::HS384, Algorithm::HS512],
        }
    }

    pub fn contains(&self, algorithm: Algorithm) -> bool {
        self.algorithms().contains(&algorithm)
    }
}

/// Lookup of verification keys by key id
pub trait ResolveKey {
    fn resolve(&self, kid: &str) -> Option<&DecodingKey>;
}

/// Checks the cryptographic validity of a signed token and decodes its claims
///
/// No semantic check (issuer, audience, expiry) happens here; that is the job
/// of [`ClaimsValidator`](crate::ClaimsValidator).
#[derive(Debug, Clone, Copy)]
pub struct SignatureVerifier {
    family: AlgorithmFamily,
}

impl SignatureVerifier {
    pub fn new(family: AlgorithmFamily) -> Self {
        Self { family }
    }

    pub fn family(&self) -> AlgorithmFamily {
        self.family
    }

    /// Verify the signature of `token` with the key named by its `kid` header
    ///
    /// # Errors
    /// - `SignatureError::Malformed` if the token cannot be decoded
    /// - `SignatureError::UnsupportedAlgorithm` if the header algorithm is outside the family
    /// - `SignatureError::KeyNotFound` if the header has no `kid` or `keys` does not know it
    /// - `SignatureError::InvalidSignature` if the signature does not match
    pub fn verify<K>(&self, token: &str, keys: &K) -> Result<VerifiedClaims, SignatureError>
    where
        K: ResolveKey + ?Sized,
    {
        let (algorithm, kid) = self.check_header(token)?;
        let key = keys
            .resolve(&kid)
            .ok_or(SignatureError::KeyNotFound(Some(kid)))?;

        let validation = signature_only_validation(algorithm);

        let token_data = decode::<Map<String, Value>>(token, key, &validation).map_err(|error| {
            match error.kind() {
                ErrorKind::InvalidSignature => SignatureError::InvalidSignature,
                ErrorKind::InvalidAlgorithm => SignatureError::UnsupportedAlgorithm(algorithm),
                _ => SignatureError::Malformed(error),
            }
        })?;

        Ok(VerifiedClaims::from_map(token_data.claims))
    }

    /// Read the header of `token` and return its algorithm and key id
    ///
    /// Cheap enough to run before any key set is fetched.
    ///
    /// # Errors
    /// - `SignatureError::Malformed` if the header cannot be decoded
    /// - `SignatureError::UnsupportedAlgorithm` if the algorithm is outside the family
    /// - `SignatureError::KeyNotFound(None)` if the header has no `kid`
    pub fn check_header(&self, token: &str) -> Result<(Algorithm, String), SignatureError> {
        let header = decode_header(token).map_err(SignatureError::Malformed)?;

        if !self.family.contains(header.alg) {
            debug!(algorithm = ?header.alg, family = ?self.family, "Rejecting token algorithm");
            return Err(SignatureError::UnsupportedAlgorithm(header.alg));
        }

        let kid = header.kid.ok_or(SignatureError::KeyNotFound(None))?;
        Ok((header.alg, kid))
    }
}

/// Validation that only checks the signature for a single algorithm
pub(crate) fn signature_only_validation(algorithm: Algorithm) -> Validation {
    let mut validation = Validation::new(algorithm);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation
}
