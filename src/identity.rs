use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ClaimsError;

/// The identity provider tags clients may send
///
/// Only Google and Kakao ship with an adapter; other tags resolve to
/// `FederationError::UnsupportedProvider` unless an adapter is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Google,
    Kakao,
    Naver,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::Kakao => "kakao",
            ProviderKind::Naver => "naver",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(ProviderKind::Google),
            "kakao" => Ok(ProviderKind::Kakao),
            "naver" => Ok(ProviderKind::Naver),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown identity provider: {0}")]
pub struct UnknownProvider(pub String);

/// A third-party token as presented by a client, tagged with the provider that issued it
#[derive(Clone)]
pub struct IdentityAssertion {
    pub provider: ProviderKind,
    pub raw_token: String,
}

impl IdentityAssertion {
    pub fn new(provider: ProviderKind, raw_token: impl Into<String>) -> Self {
        Self {
            provider,
            raw_token: raw_token.into(),
        }
    }
}

// The raw token is a credential and stays out of debug output.
impl fmt::Debug for IdentityAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityAssertion")
            .field("provider", &self.provider)
            .field("raw_token", &"[REDACTED]")
            .finish()
    }
}

/// Provider-agnostic identity produced by every [`IdentityProvider`](crate::IdentityProvider).
///
/// The external id is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedIdentity {
    external_id: String,
    email: Option<String>,
    provider: ProviderKind,
}

impl NormalizedIdentity {
    /// # Errors
    /// Returns `ClaimsError::MissingClaim("sub")` if `external_id` is empty
    pub fn new(
        external_id: impl Into<String>,
        email: Option<String>,
        provider: ProviderKind,
    ) -> Result<Self, ClaimsError> {
        let external_id = external_id.into();
        if external_id.trim().is_empty() {
            return Err(ClaimsError::MissingClaim("sub"));
        }

        Ok(Self {
            external_id,
            email: email.filter(|email| !email.is_empty()),
            provider,
        })
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_round_trips_through_str() {
        for kind in [ProviderKind::Google, ProviderKind::Kakao, ProviderKind::Naver] {
            assert_eq!(kind.as_str().parse::<ProviderKind>().unwrap(), kind);
        }
        assert_eq!("Google".parse::<ProviderKind>().unwrap(), ProviderKind::Google);
        assert_eq!(" naver ".parse::<ProviderKind>().unwrap(), ProviderKind::Naver);
        assert!("apple".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn empty_external_id_is_rejected() {
        let result = NormalizedIdentity::new("  ", None, ProviderKind::Kakao);
        assert!(matches!(result, Err(ClaimsError::MissingClaim("sub"))));
    }

    #[test]
    fn empty_email_is_treated_as_absent() {
        let identity =
            NormalizedIdentity::new("123", Some(String::new()), ProviderKind::Google).unwrap();
        assert_eq!(identity.email(), None);
    }

    #[test]
    fn assertion_debug_redacts_token() {
        let assertion = IdentityAssertion::new(ProviderKind::Kakao, "secret-token");
        assert!(!format!("{assertion:?}").contains("secret-token"));
    }
}
