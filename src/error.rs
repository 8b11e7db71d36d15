use jsonwebtoken::Algorithm;
use reqwest::StatusCode;
use thiserror::Error;

use crate::identity::ProviderKind;
use crate::session::TokenType;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error of the crate.
///
/// Every component returns its own typed error; this enum only collects them
/// so that callers holding a mix of operations can use a single `?`.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    KeyFetch(#[from] KeyFetchError),
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error(transparent)]
    Claims(#[from] ClaimsError),
    #[error(transparent)]
    Federation(#[from] FederationError),
    #[error(transparent)]
    TokenIssue(#[from] TokenIssueError),
    #[error(transparent)]
    TokenVerify(#[from] TokenVerifyError),
    #[error(transparent)]
    TokenParse(#[from] TokenParseError),
    #[error(transparent)]
    Cipher(#[from] CipherError),
    #[error(
        "No audiences configured - at least one allowed audience must be configured for security"
    )]
    NoAudiencesConfigured,
    #[error("No issuers configured - at least one allowed issuer must be configured")]
    NoIssuersConfigured,
    #[error("Application id must be an integer, got '{0}'")]
    InvalidAppId(String),
}

/// Flat classification of failures, for callers that map errors to a transport response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    KeyFetch,
    Signature,
    Claims,
    Federation,
    TokenIssue,
    TokenVerify,
    TokenParse,
    Cipher,
    Configuration,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::KeyFetch(_) => ErrorKind::KeyFetch,
            Error::Signature(_) => ErrorKind::Signature,
            Error::Claims(_) => ErrorKind::Claims,
            Error::Federation(_) => ErrorKind::Federation,
            Error::TokenIssue(_) => ErrorKind::TokenIssue,
            Error::TokenVerify(_) => ErrorKind::TokenVerify,
            Error::TokenParse(_) => ErrorKind::TokenParse,
            Error::Cipher(_) => ErrorKind::Cipher,
            Error::NoAudiencesConfigured
            | Error::NoIssuersConfigured
            | Error::InvalidAppId(_) => ErrorKind::Configuration,
        }
    }

    /// True when the failure points at the identity provider being unreachable
    /// rather than at the presented token being bad.
    pub fn is_provider_unavailable(&self) -> bool {
        match self {
            Error::KeyFetch(_) => true,
            Error::Federation(err) => err.is_provider_unavailable(),
            _ => false,
        }
    }
}

/// Failure to retrieve or parse a provider's key set.
#[derive(Error, Debug)]
#[error("Failed to fetch key set for provider {provider}: {cause}")]
pub struct KeyFetchError {
    pub provider: String,
    #[source]
    pub cause: KeyFetchCause,
}

impl KeyFetchError {
    pub(crate) fn new(provider: impl Into<String>, cause: KeyFetchCause) -> Self {
        Self {
            provider: provider.into(),
            cause,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.cause, KeyFetchCause::Timeout)
    }
}

#[derive(Error, Debug)]
pub enum KeyFetchCause {
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("endpoint returned status {0}")]
    Status(StatusCode),
    #[error("malformed key set: {0}")]
    Malformed(String),
}

pub(crate) fn key_fetch_transport_error(provider: &str, error: reqwest::Error) -> KeyFetchError {
    let cause = if error.is_timeout() {
        KeyFetchCause::Timeout
    } else if error.is_decode() {
        KeyFetchCause::Malformed(error.to_string())
    } else {
        KeyFetchCause::Transport(error)
    };
    KeyFetchError::new(provider, cause)
}

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("Algorithm {0:?} is not allowed for this provider")]
    UnsupportedAlgorithm(Algorithm),
    #[error("No key matches the key id of the provided token: {0:?}")]
    KeyNotFound(Option<String>),
    #[error("Signature of the provided token is invalid")]
    InvalidSignature,
    #[error("The provided token could not be decoded: {0}")]
    Malformed(#[source] jsonwebtoken::errors::Error),
}

#[derive(Error, Debug)]
pub enum ClaimsError {
    #[error("Required claim '{0}' is missing")]
    MissingClaim(&'static str),
    #[error("The provided token does not match any allowed issuer. Provided issuer: {0}")]
    IssuerMismatch(String),
    #[error("The provided token does not match any allowed audience. Provided audiences: {0:?}")]
    AudienceMismatch(Vec<String>),
    #[error("The provided token has expired. Expiration timestamp: {0}")]
    Expired(i64),
}

/// Failure of a provider adapter to turn a third-party token into an identity.
#[derive(Error, Debug)]
pub enum FederationError {
    #[error(transparent)]
    KeyFetch(KeyFetchError),
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error(transparent)]
    Claims(#[from] ClaimsError),
    #[error("Request to {provider} timed out")]
    Timeout { provider: String },
    #[error("{provider} is unavailable: {reason}")]
    Unavailable { provider: String, reason: String },
    #[error("{provider} rejected the token: {reason}")]
    ProviderRejected { provider: String, reason: String },
    #[error("Malformed response from {provider}: {reason}")]
    MalformedResponse { provider: String, reason: String },
    #[error("No identity provider registered for {0}")]
    UnsupportedProvider(ProviderKind),
}

impl FederationError {
    pub fn is_provider_unavailable(&self) -> bool {
        matches!(
            self,
            FederationError::KeyFetch(_)
                | FederationError::Timeout { .. }
                | FederationError::Unavailable { .. }
        )
    }
}

impl From<KeyFetchError> for FederationError {
    fn from(error: KeyFetchError) -> Self {
        if error.is_timeout() {
            return FederationError::Timeout {
                provider: error.provider,
            };
        }
        FederationError::KeyFetch(error)
    }
}

#[derive(Error, Debug)]
#[error("Failed to sign {token_type} token: {source}")]
pub struct TokenIssueError {
    pub token_type: TokenType,
    #[source]
    pub source: jsonwebtoken::errors::Error,
}

#[derive(Error, Debug)]
pub enum TokenVerifyError {
    #[error("The session token has expired. Expiration timestamp: {0}")]
    Expired(i64),
    #[error("Signature of the session token is invalid")]
    InvalidSignature,
    #[error("Expected a {expected} token, got a {found} token")]
    WrongTokenType {
        expected: TokenType,
        found: TokenType,
    },
    #[error("Malformed session token: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum TokenParseError {
    #[error("Failed to extract identity from session token: {0}")]
    Unverified(#[from] TokenVerifyError),
}

#[derive(Error, Debug)]
pub enum CipherError {
    #[error("Invalid cipher key: {0}")]
    InvalidKey(String),
    #[error("Invalid sealed payload encoding: {0}")]
    Encoding(String),
    #[error("Failed to seal payload")]
    Seal,
    #[error("Failed to open sealed payload")]
    Open,
}
