use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::Client;
use secrecy::SecretString;

use crate::error::Error;
use crate::error::Result;
use crate::signature::AlgorithmFamily;

const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_MIN_REFRESH_INTERVAL_SECS: u64 = 5;
const DEFAULT_OUTBOUND_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ACCESS_LIFETIME_SECS: u64 = 24 * 60 * 60;
const DEFAULT_REFRESH_LIFETIME_SECS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_SESSION_ISSUER: &str = "federauth";

/// Trust policy for a provider that issues self-contained signed tokens
#[derive(Debug, Clone)]
pub struct TrustConfig {
    /// URL of the provider's published key set
    pub(crate) key_set_url: String,
    /// Issuers accepted in the `iss` claim
    pub(crate) allowed_issuers: BTreeSet<String>,
    /// Audiences accepted in the `aud` claim - the token must match at least one
    pub(crate) allowed_audiences: BTreeSet<String>,
    /// The only algorithm family tokens may be signed with
    pub(crate) algorithm_family: AlgorithmFamily,
    /// Whether `https://host`, `http://host` and `host` count as the same issuer
    pub(crate) issuer_scheme_variants: bool,
    /// Whether the `email` claim must be present
    pub(crate) require_email: bool,
    /// Clock skew tolerated on `exp` (default: none)
    pub(crate) leeway: Duration,
    /// Time-to-live for the cached key set (default: 1 hour)
    pub(crate) cache_ttl: Duration,
    /// Minimum time between two forced key set refreshes (default: 5 seconds)
    pub(crate) min_refresh_interval: Duration,
    /// Bound on every outbound request (default: 10 seconds)
    pub(crate) timeout: Duration,
    /// Optional custom HTTP client for fetching the key set
    /// If not provided, a default client will be created
    pub(crate) http_client: Option<Client>,
}

impl TrustConfig {
    /// Create a new configuration with a single allowed issuer and audience
    pub fn new(
        key_set_url: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            key_set_url: key_set_url.into(),
            allowed_issuers: BTreeSet::from([issuer.into()]),
            allowed_audiences: BTreeSet::from([audience.into()]),
            algorithm_family: AlgorithmFamily::Rsa,
            issuer_scheme_variants: false,
            require_email: false,
            leeway: Duration::ZERO,
            cache_ttl: Duration::from_secs(DEFAULT_JWKS_CACHE_TTL_SECS),
            min_refresh_interval: Duration::from_secs(DEFAULT_MIN_REFRESH_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_OUTBOUND_TIMEOUT_SECS),
            http_client: None,
        }
    }

    /// Create a new configuration with several allowed issuers and audiences
    ///
    /// # Errors
    /// Returns `Error::NoIssuersConfigured` or `Error::NoAudiencesConfigured`
    /// if the corresponding vector is empty
    pub fn new_with_audiences(
        key_set_url: impl Into<String>,
        issuers: Vec<String>,
        audiences: Vec<String>,
    ) -> Result<Self> {
        let mut issuers = issuers.into_iter();
        let first_issuer = issuers.next().ok_or(Error::NoIssuersConfigured)?;

        let mut config = Self::new(key_set_url, first_issuer, String::new());
        config.allowed_issuers.extend(issuers);
        config.with_audiences(audiences)
    }

    /// Replace the allowed audiences
    ///
    /// # Errors
    /// Returns `Error::NoAudiencesConfigured` if the audiences vector is empty
    pub fn with_audiences(mut self, audiences: Vec<String>) -> Result<Self> {
        if audiences.is_empty() {
            return Err(Error::NoAudiencesConfigured);
        }
        self.allowed_audiences = audiences.into_iter().collect();
        Ok(self)
    }

    /// Add a single allowed audience
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.allowed_audiences.insert(audience.into());
        self
    }

    /// Add a single allowed issuer
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.allowed_issuers.insert(issuer.into());
        self
    }

    /// Fetch the key set from another URL, e.g. a mirror
    pub fn with_key_set_url(mut self, url: impl Into<String>) -> Self {
        self.key_set_url = url.into();
        self
    }

    pub fn with_algorithm_family(mut self, family: AlgorithmFamily) -> Self {
        self.algorithm_family = family;
        self
    }

    /// Treat issuers that differ only in an `https://` or `http://` prefix as equal
    pub fn with_issuer_scheme_variants(mut self, enabled: bool) -> Self {
        self.issuer_scheme_variants = enabled;
        self
    }

    pub fn with_email_required(mut self, required: bool) -> Self {
        self.require_email = required;
        self
    }

    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Set the key set cache TTL
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom HTTP client
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn key_set_url(&self) -> &str {
        &self.key_set_url
    }

    pub fn algorithm_family(&self) -> AlgorithmFamily {
        self.algorithm_family
    }
}

/// Configuration for a provider that validates opaque tokens through an introspection call
#[derive(Debug, Clone)]
pub struct IntrospectionConfig {
    pub(crate) introspection_url: String,
    /// Application id the provider must report for the token
    pub(crate) expected_app_id: i64,
    pub(crate) timeout: Duration,
    pub(crate) http_client: Option<Client>,
}

impl IntrospectionConfig {
    /// # Errors
    /// Returns `Error::InvalidAppId` if `expected_app_id` is not an integer
    pub fn new(introspection_url: impl Into<String>, expected_app_id: &str) -> Result<Self> {
        let expected_app_id = expected_app_id
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::InvalidAppId(expected_app_id.to_string()))?;

        Ok(Self {
            introspection_url: introspection_url.into(),
            expected_app_id,
            timeout: Duration::from_secs(DEFAULT_OUTBOUND_TIMEOUT_SECS),
            http_client: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom HTTP client
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn introspection_url(&self) -> &str {
        &self.introspection_url
    }

    pub fn expected_app_id(&self) -> i64 {
        self.expected_app_id
    }
}

/// OAuth 2.0 client credentials for exchanging an authorization code at a provider's token endpoint
#[derive(Debug, Clone)]
pub struct CodeExchangeConfig {
    pub(crate) token_url: String,
    pub(crate) client_id: String,
    pub(crate) client_secret: SecretString,
    /// Must equal the redirect URL used when the code was requested
    pub(crate) redirect_url: String,
    pub(crate) timeout: Duration,
    pub(crate) http_client: Option<Client>,
}

impl CodeExchangeConfig {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            redirect_url: redirect_url.into(),
            timeout: Duration::from_secs(DEFAULT_OUTBOUND_TIMEOUT_SECS),
            http_client: None,
        }
    }

    /// Send the exchange to another token endpoint
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom HTTP client
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

/// Signing keys and lifetimes of the session tokens this service issues
///
/// Access and refresh tokens share one secret unless a refresh secret is set.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub(crate) access_secret: SecretString,
    pub(crate) refresh_secret: Option<SecretString>,
    pub(crate) access_lifetime: Duration,
    pub(crate) refresh_lifetime: Duration,
    pub(crate) issuer: String,
}

impl SessionConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            access_secret: SecretString::new(secret.into()),
            refresh_secret: None,
            access_lifetime: Duration::from_secs(DEFAULT_ACCESS_LIFETIME_SECS),
            refresh_lifetime: Duration::from_secs(DEFAULT_REFRESH_LIFETIME_SECS),
            issuer: DEFAULT_SESSION_ISSUER.to_string(),
        }
    }

    /// Sign refresh tokens with their own secret
    pub fn with_refresh_secret(mut self, secret: impl Into<String>) -> Self {
        self.refresh_secret = Some(SecretString::new(secret.into()));
        self
    }

    pub fn with_access_lifetime(mut self, lifetime: Duration) -> Self {
        self.access_lifetime = lifetime;
        self
    }

    pub fn with_refresh_lifetime(mut self, lifetime: Duration) -> Self {
        self.refresh_lifetime = lifetime;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub(crate) fn refresh_secret(&self) -> &SecretString {
        self.refresh_secret.as_ref().unwrap_or(&self.access_secret)
    }
}
