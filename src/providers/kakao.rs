//! Kakao access token validation
//!
//! Kakao access tokens are opaque, so they cannot be verified locally. Instead
//! the token is presented as a bearer credential to Kakao's token-info endpoint,
//! which answers with the application the token was issued to and the user id:
//!
//! ```json
//! { "id": 123456789, "expires_in": 7199, "app_id": 987654 }
//! ```
//!
//! The token is only accepted when `app_id` equals the configured application id.
//! Kakao does not return an email on this path.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::IntrospectionConfig;
use crate::error::FederationError;
use crate::error::Result;
use crate::identity::NormalizedIdentity;
use crate::identity::ProviderKind;
use crate::providers::malformed;
use crate::providers::status_error;
use crate::providers::transport_error;
use crate::providers::IdentityProvider;

/// Kakao's token-info endpoint
pub const KAKAO_TOKEN_INFO_URL: &str = "https://kapi.kakao.com/v1/user/access_token_info";

const PROVIDER: ProviderKind = ProviderKind::Kakao;

#[derive(Debug, Deserialize)]
struct TokenInfo {
    #[serde(default)]
    app_id: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
}

impl IntrospectionConfig {
    /// Introspection against Kakao's token-info endpoint for the given application id
    ///
    /// # Errors
    /// Returns `Error::InvalidAppId` if `app_id` is not an integer
    pub fn kakao(app_id: &str) -> Result<Self> {
        IntrospectionConfig::new(KAKAO_TOKEN_INFO_URL, app_id)
    }
}

/// Identity provider for Kakao access tokens
#[derive(Debug, Clone)]
pub struct KakaoProvider {
    config: IntrospectionConfig,
    client: Client,
}

impl KakaoProvider {
    pub fn new(config: IntrospectionConfig) -> Self {
        let client = config.http_client.clone().unwrap_or_default();
        Self { config, client }
    }

    /// Ask Kakao about `token` and extract the user it belongs to
    ///
    /// # Errors
    /// - `FederationError::Timeout` if Kakao does not answer within the configured timeout
    /// - `FederationError::Unavailable` on transport failures and server errors
    /// - `FederationError::ProviderRejected` if Kakao refuses the token or it belongs to another app
    /// - `FederationError::MalformedResponse` if the answer lacks `app_id` or `id`
    pub async fn introspect(&self, token: &str) -> Result<NormalizedIdentity, FederationError> {
        let response = self
            .client
            .get(&self.config.introspection_url)
            .bearer_auth(token)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|error| transport_error(PROVIDER, error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(PROVIDER, "token info", status, None));
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| transport_error(PROVIDER, error))?;
        let info: TokenInfo = serde_json::from_slice(&body)
            .map_err(|error| malformed(PROVIDER, format!("invalid token info: {error}")))?;

        let app_id = info
            .app_id
            .as_ref()
            .and_then(app_id_of)
            .ok_or_else(|| malformed(PROVIDER, "missing app_id"))?;
        let user_id = info
            .id
            .as_ref()
            .and_then(id_to_string)
            .ok_or_else(|| malformed(PROVIDER, "missing id"))?;

        if app_id != self.config.expected_app_id {
            debug!(app_id, "Kakao token belongs to another application");
            return Err(FederationError::ProviderRejected {
                provider: PROVIDER.to_string(),
                reason: format!("token was issued to application {app_id}"),
            });
        }

        NormalizedIdentity::new(user_id, None, PROVIDER)
            .map_err(|_| malformed(PROVIDER, "empty id"))
    }
}

#[async_trait]
impl IdentityProvider for KakaoProvider {
    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    async fn validate(&self, token: &str) -> Result<NormalizedIdentity, FederationError> {
        self.introspect(token).await
    }
}

/// Kakao ids are numbers, but accept their string form as well
fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(number.to_string()),
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        _ => None,
    }
}

/// Numeric application id, from a JSON integer, an integral float or a numeric string
fn app_id_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|id| id.fract() == 0.0 && id.abs() < i64::MAX as f64)
                .map(|id| id as i64)
        }),
        Value::String(id) => id.trim().parse().ok(),
        _ => None,
    }
}
