//! Provider-specific identity adapters
//!
//! Every provider implements [`IdentityProvider`], so callers never need to know
//! which trust model is behind a token:
//!
//! - [`google`]: self-contained ID tokens verified against Google's published key set
//! - [`kakao`]: opaque access tokens validated through Kakao's token-info endpoint
//!
//! A [`ProviderRegistry`] selects the adapter from the provider tag of an
//! [`IdentityAssertion`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use federauth::providers::google::GoogleProvider;
//! use federauth::providers::kakao::KakaoProvider;
//! use federauth::{IdentityAssertion, IntrospectionConfig, ProviderKind, ProviderRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ProviderRegistry::new()
//!     .with(Arc::new(GoogleProvider::with_client_ids(vec![
//!         "ios-client-id".to_string(),
//!         "android-client-id".to_string(),
//!     ])?))
//!     .with(Arc::new(KakaoProvider::new(IntrospectionConfig::kakao("123456")?)));
//!
//! let assertion = IdentityAssertion::new(ProviderKind::Kakao, "opaque-access-token");
//! let identity = registry.validate(&assertion).await?;
//! println!("{} user {}", identity.provider(), identity.external_id());
//! # Ok(())
//! # }
//! ```

pub mod google;
pub mod kakao;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::error::FederationError;
use crate::identity::IdentityAssertion;
use crate::identity::NormalizedIdentity;
use crate::identity::ProviderKind;

/// Validates a third-party token and returns the identity it asserts
///
/// Implementations hold only read-only configuration and caches, so one instance
/// serves any number of concurrent requests. Outbound calls are bounded by the
/// provider's timeout; dropping the returned future cancels them.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The provider this adapter validates tokens for
    fn kind(&self) -> ProviderKind;

    /// Validate `token` and extract the identity it asserts
    async fn validate(&self, token: &str) -> Result<NormalizedIdentity, FederationError>;
}

/// Set of configured identity providers, selected by provider tag
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn IdentityProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any earlier one of the same kind
    pub fn register(&mut self, provider: Arc<dyn IdentityProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    pub fn with(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&Arc<dyn IdentityProvider>> {
        self.providers.get(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ProviderKind> + '_ {
        self.providers.keys().copied()
    }

    /// Validate an assertion with the provider it is tagged with
    ///
    /// # Errors
    /// Returns `FederationError::UnsupportedProvider` if no provider of that kind
    /// is registered, otherwise whatever the provider returns
    pub async fn validate(
        &self,
        assertion: &IdentityAssertion,
    ) -> Result<NormalizedIdentity, FederationError> {
        let provider = self
            .get(assertion.provider)
            .ok_or(FederationError::UnsupportedProvider(assertion.provider))?;

        debug!(provider = %assertion.provider, "Validating identity assertion");
        provider.validate(&assertion.raw_token).await
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Map a failed outbound request to the provider being slow or unreachable
pub(crate) fn transport_error(provider: ProviderKind, error: reqwest::Error) -> FederationError {
    if error.is_timeout() {
        return FederationError::Timeout {
            provider: provider.to_string(),
        };
    }
    FederationError::Unavailable {
        provider: provider.to_string(),
        reason: error.to_string(),
    }
}

/// Map a non-success status: server errors mean unavailable, anything else is a rejection
pub(crate) fn status_error(
    provider: ProviderKind,
    endpoint: &str,
    status: StatusCode,
    detail: Option<String>,
) -> FederationError {
    let reason = match detail {
        Some(detail) => format!("{endpoint} endpoint returned {status}: {detail}"),
        None => format!("{endpoint} endpoint returned {status}"),
    };

    if status.is_server_error() {
        return FederationError::Unavailable {
            provider: provider.to_string(),
            reason,
        };
    }
    FederationError::ProviderRejected {
        provider: provider.to_string(),
        reason,
    }
}

pub(crate) fn malformed(provider: ProviderKind, reason: impl Into<String>) -> FederationError {
    FederationError::MalformedResponse {
        provider: provider.to_string(),
        reason: reason.into(),
    }
}
