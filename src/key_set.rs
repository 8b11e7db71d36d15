use std::collections::HashMap;
use std::time::Duration;

use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::DecodingKey;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use crate::error::key_fetch_transport_error;
use crate::error::KeyFetchCause;
use crate::error::KeyFetchError;
use crate::signature::ResolveKey;

/// Raw key set document; keys are parsed one by one so a single key of an
/// unsupported type does not invalidate the whole set
#[derive(Debug, Deserialize)]
struct RawKeySet {
    keys: Vec<Value>,
}

/// A provider's public verification keys, addressable by key id
#[derive(Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, DecodingKey>,
}

impl KeySet {
    /// Parse a key set document (`{"keys": [...]}`)
    ///
    /// Keys that cannot be parsed or carry no `kid` are skipped.
    ///
    /// # Errors
    /// Returns `KeyFetchCause::Malformed` if the document has no `keys` array
    /// or none of its keys is usable
    pub fn from_json(body: &[u8]) -> Result<Self, KeyFetchCause> {
        let raw: RawKeySet = serde_json::from_slice(body)
            .map_err(|error| KeyFetchCause::Malformed(error.to_string()))?;

        let mut keys = HashMap::with_capacity(raw.keys.len());
        for value in raw.keys {
            match parse_key(value) {
                Ok((kid, key)) => {
                    keys.insert(kid, key);
                }
                Err(reason) => warn!(reason = %reason, "Skipping unusable key in key set"),
            }
        }

        if keys.is_empty() {
            return Err(KeyFetchCause::Malformed(
                "key set contains no usable keys".to_string(),
            ));
        }

        Ok(Self { keys })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    pub fn key_ids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for KeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySet")
            .field("key_ids", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ResolveKey for KeySet {
    fn resolve(&self, kid: &str) -> Option<&DecodingKey> {
        self.keys.get(kid)
    }
}

fn parse_key(value: Value) -> Result<(String, DecodingKey), String> {
    let jwk: Jwk = serde_json::from_value(value).map_err(|error| error.to_string())?;
    let kid = jwk
        .common
        .key_id
        .clone()
        .ok_or_else(|| "key has no kid".to_string())?;
    let key = DecodingKey::from_jwk(&jwk).map_err(|error| format!("kid {kid}: {error}"))?;
    Ok((kid, key))
}

/// Retrieves a provider's key set from its published URL
///
/// Every call to [`fetch`](KeySetFetcher::fetch) issues exactly one request;
/// there is no retry and no caching here.
#[derive(Debug, Clone)]
pub struct KeySetFetcher {
    provider: String,
    url: String,
    client: Client,
    timeout: Duration,
}

impl KeySetFetcher {
    pub fn new(
        provider: impl Into<String>,
        url: impl Into<String>,
        client: Client,
        timeout: Duration,
    ) -> Self {
        Self {
            provider: provider.into(),
            url: url.into(),
            client,
            timeout,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and parse the key set
    ///
    /// # Errors
    /// Returns a `KeyFetchError` on network failure, timeout, non-success status
    /// or a malformed key set document
    pub async fn fetch(&self) -> Result<KeySet, KeyFetchError> {
        debug!(provider = %self.provider, url = %self.url, "Fetching key set");

        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|error| key_fetch_transport_error(&self.provider, error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeyFetchError::new(
                &self.provider,
                KeyFetchCause::Status(status),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| key_fetch_transport_error(&self.provider, error))?;

        let key_set =
            KeySet::from_json(&body).map_err(|cause| KeyFetchError::new(&self.provider, cause))?;

        debug!(provider = %self.provider, key_count = key_set.len(), "Fetched key set");
        Ok(key_set)
    }
}
