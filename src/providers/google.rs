//! Google ID token validation
//!
//! Google signs ID tokens with rotating RSA keys published at
//! [`GOOGLE_KEY_SET_URL`]. Depending on the client library the `iss` claim is
//! either `accounts.google.com` or `https://accounts.google.com`, so both are
//! allowed. Apps usually have one OAuth client id per platform (iOS, Android,
//! web); a token is accepted if its `aud` matches any of them.
//!
//! ## Claims Structure
//!
//! ```json
//! {
//!   "iss": "https://accounts.google.com",
//!   "aud": "1234-ios.apps.googleusercontent.com",
//!   "sub": "110169484474386276334",
//!   "email": "user@example.com",
//!   "exp": 1234567890
//! }
//! ```
//!
//! ## Authorization code flow
//!
//! Web clients may hand over an authorization code instead of an ID token.
//! [`GoogleCodeExchange`] trades it at Google's token endpoint for an access
//! token and an ID token; the ID token then goes through the regular
//! [`GoogleProvider`] verification.

use std::fmt;

use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::debug;

use crate::config::CodeExchangeConfig;
use crate::config::TrustConfig;
use crate::error::FederationError;
use crate::error::Result;
use crate::extractor::GoogleExtractor;
use crate::identity::NormalizedIdentity;
use crate::identity::ProviderKind;
use crate::providers::malformed;
use crate::providers::status_error;
use crate::providers::transport_error;
use crate::signature::AlgorithmFamily;
use crate::verifier::JwtProvider;

/// Google's published signing keys
pub const GOOGLE_KEY_SET_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// Google's OAuth 2.0 token endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const PROVIDER: ProviderKind = ProviderKind::Google;

/// Both issuer forms Google puts into ID tokens
pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Convenience type alias for the Google identity provider
pub type GoogleProvider = JwtProvider<GoogleExtractor>;

impl GoogleProvider {
    /// Create a Google provider accepting tokens issued for any of `client_ids`
    ///
    /// # Errors
    /// Returns `Error::NoAudiencesConfigured` if `client_ids` is empty
    pub fn with_client_ids(client_ids: Vec<String>) -> Result<Self> {
        Ok(Self::new(TrustConfig::google(client_ids)?, GoogleExtractor))
    }
}

impl TrustConfig {
    /// Trust policy for Google ID tokens issued to any of `client_ids`
    ///
    /// # Errors
    /// Returns `Error::NoAudiencesConfigured` if `client_ids` is empty
    pub fn google(client_ids: Vec<String>) -> Result<Self> {
        let issuers = GOOGLE_ISSUERS.iter().map(|issuer| issuer.to_string()).collect();

        Ok(
            TrustConfig::new_with_audiences(GOOGLE_KEY_SET_URL, issuers, client_ids)?
                .with_algorithm_family(AlgorithmFamily::Rsa)
                .with_email_required(true),
        )
    }
}

impl CodeExchangeConfig {
    /// Code exchange against Google's token endpoint
    pub fn google(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        CodeExchangeConfig::new(GOOGLE_TOKEN_URL, client_id, client_secret, redirect_url)
    }
}

/// Tokens returned by a successful authorization code exchange
#[derive(Clone, Deserialize)]
pub struct ExchangedTokens {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime of the access token in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Present when the `openid` scope was granted
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl fmt::Debug for ExchangedTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangedTokens")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("id_token", &self.id_token.as_ref().map(|_| "[REDACTED]"))
            .field("scope", &self.scope)
            .finish()
    }
}

/// OAuth 2.0 error body of the token endpoint
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Exchanges Google authorization codes for tokens
#[derive(Debug, Clone)]
pub struct GoogleCodeExchange {
    config: CodeExchangeConfig,
    client: Client,
}

impl GoogleCodeExchange {
    pub fn new(config: CodeExchangeConfig) -> Self {
        let client = config.http_client.clone().unwrap_or_default();
        Self { config, client }
    }

    /// Trade `code` for tokens at the token endpoint
    ///
    /// # Errors
    /// - `FederationError::Timeout` if the endpoint does not answer within the configured timeout
    /// - `FederationError::Unavailable` on transport failures and server errors
    /// - `FederationError::ProviderRejected` if Google refuses the code, e.g. `invalid_grant`
    /// - `FederationError::MalformedResponse` if the answer is not a token response
    pub async fn exchange(&self, code: &str) -> Result<ExchangedTokens, FederationError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret().as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&form)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|error| transport_error(PROVIDER, error))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| transport_error(PROVIDER, error))?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<TokenErrorResponse>(&body)
                .ok()
                .map(|error| match error.error_description {
                    Some(description) => format!("{} ({description})", error.error),
                    None => error.error,
                });
            return Err(status_error(PROVIDER, "token", status, detail));
        }

        let tokens: ExchangedTokens = serde_json::from_slice(&body)
            .map_err(|error| malformed(PROVIDER, format!("invalid token response: {error}")))?;

        debug!(
            expires_in = ?tokens.expires_in,
            has_id_token = tokens.id_token.is_some(),
            "Exchanged Google authorization code"
        );
        Ok(tokens)
    }

    /// Trade `code` for tokens and verify the returned ID token with `provider`
    ///
    /// # Errors
    /// Everything [`exchange`](GoogleCodeExchange::exchange) and
    /// [`GoogleProvider::verify`] return, plus `FederationError::MalformedResponse`
    /// if the response carries no ID token
    pub async fn exchange_for_identity(
        &self,
        code: &str,
        provider: &GoogleProvider,
    ) -> Result<NormalizedIdentity, FederationError> {
        let tokens = self.exchange(code).await?;
        let id_token = tokens
            .id_token
            .ok_or_else(|| malformed(PROVIDER, "token response has no id_token"))?;

        provider.verify(&id_token).await
    }
}
