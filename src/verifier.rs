use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::claims::ClaimsValidator;
use crate::claims::VerifiedClaims;
use crate::config::TrustConfig;
use crate::error::FederationError;
use crate::error::SignatureError;
use crate::extractor::IdentityExtractor;
use crate::identity::NormalizedIdentity;
use crate::identity::ProviderKind;
use crate::jwks_cache::KeySetCache;
use crate::key_set::KeySetFetcher;
use crate::providers::IdentityProvider;
use crate::signature::SignatureVerifier;

/// Identity provider for self-contained signed tokens verified against a published key set
///
/// Generic over an `IdentityExtractor` type that defines how to extract identity
/// information from validated JWT claims.
pub struct JwtProvider<E: IdentityExtractor> {
    fetcher: KeySetFetcher,
    cache: Arc<KeySetCache>,
    signature: SignatureVerifier,
    trust: TrustConfig,
    extractor: E,
}

impl<E: IdentityExtractor> JwtProvider<E> {
    /// Create a new provider with its own key set cache
    pub fn new(config: TrustConfig, extractor: E) -> Self {
        let cache = Arc::new(KeySetCache::new(
            config.cache_ttl,
            config.min_refresh_interval,
        ));
        Self::with_shared_cache(config, extractor, cache)
    }

    /// Create a new provider that stores its key set in a cache shared with other providers
    pub fn with_shared_cache(config: TrustConfig, extractor: E, cache: Arc<KeySetCache>) -> Self {
        let client = config.http_client.clone().unwrap_or_default();
        let fetcher = KeySetFetcher::new(
            extractor.provider().as_str(),
            config.key_set_url.clone(),
            client,
            config.timeout,
        );

        Self {
            fetcher,
            cache,
            signature: SignatureVerifier::new(config.algorithm_family),
            trust: config,
            extractor,
        }
    }

    pub fn trust_config(&self) -> &TrustConfig {
        &self.trust
    }

    /// Verify a token and extract the identity it asserts
    ///
    /// # Errors
    /// Returns a `FederationError` wrapping the failing stage: key set fetch,
    /// signature verification, claims validation or identity extraction
    pub async fn verify(&self, token: &str) -> Result<NormalizedIdentity, FederationError> {
        let claims = self.verify_signature(token).await?;
        ClaimsValidator::validate(&claims, &self.trust)?;

        Ok(self.extractor.extract_identity(&claims)?)
    }

    /// Verify the signature, refreshing the key set once if the token names an unknown key
    async fn verify_signature(&self, token: &str) -> Result<VerifiedClaims, FederationError> {
        // Reject bad headers before touching the network
        self.signature.check_header(token)?;

        let key_set = self.cache.get(&self.fetcher).await?;

        match self.signature.verify(token, key_set.as_ref()) {
            Err(SignatureError::KeyNotFound(Some(kid))) => {
                debug!(provider = %self.fetcher.provider(), kid = %kid, "Unknown key id, refreshing key set");
                let key_set = self.cache.refresh(&self.fetcher).await?;
                Ok(self.signature.verify(token, key_set.as_ref())?)
            }
            result => Ok(result?),
        }
    }
}

#[async_trait]
impl<E: IdentityExtractor> IdentityProvider for JwtProvider<E> {
    fn kind(&self) -> ProviderKind {
        self.extractor.provider()
    }

    async fn validate(&self, token: &str) -> Result<NormalizedIdentity, FederationError> {
        self.verify(token).await
    }
}
