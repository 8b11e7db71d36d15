use std::fmt;
use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use secrecy::ExposeSecret;
use tracing::debug;

use super::verifier::SessionTokenVerifier;
use super::SessionClaims;
use super::TokenType;
use super::UserId;
use crate::config::SessionConfig;
use crate::error::Result;
use crate::error::TokenIssueError;

/// A freshly minted access/refresh token pair
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedTokens {
    pub access_token: String,
    /// Expiration of the access token (Unix timestamp)
    pub access_expires_at: i64,
    pub refresh_token: String,
    /// Expiration of the refresh token (Unix timestamp)
    pub refresh_expires_at: i64,
}

impl fmt::Debug for IssuedTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedTokens")
            .field("access_token", &"[REDACTED]")
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_token", &"[REDACTED]")
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish()
    }
}

/// Mints signed session tokens for an authenticated user
pub struct SessionTokenIssuer {
    access_key: EncodingKey,
    refresh_key: EncodingKey,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
    issuer: String,
    verifier: SessionTokenVerifier,
}

impl SessionTokenIssuer {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            access_key: EncodingKey::from_secret(config.access_secret.expose_secret().as_bytes()),
            refresh_key: EncodingKey::from_secret(
                config.refresh_secret().expose_secret().as_bytes(),
            ),
            access_lifetime: config.access_lifetime,
            refresh_lifetime: config.refresh_lifetime,
            issuer: config.issuer.clone(),
            verifier: SessionTokenVerifier::new(config),
        }
    }

    /// Issue an access and a refresh token for `user_id`
    ///
    /// # Errors
    /// Returns `TokenIssueError` if signing either token fails; no partial pair is returned
    pub fn issue(
        &self,
        user_id: UserId,
        email: Option<&str>,
    ) -> Result<IssuedTokens, TokenIssueError> {
        self.issue_at(user_id, email, Utc::now())
    }

    /// Issue a token pair as if the current time were `now`
    ///
    /// # Errors
    /// Returns `TokenIssueError` if signing either token fails
    pub fn issue_at(
        &self,
        user_id: UserId,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<IssuedTokens, TokenIssueError> {
        let access = self.claims(user_id, email, now, TokenType::Access);
        let refresh = self.claims(user_id, email, now, TokenType::Refresh);

        let access_token = sign(&access, &self.access_key)?;
        let refresh_token = sign(&refresh, &self.refresh_key)?;

        debug!(user_id, access_expires_at = access.exp, "Issued session tokens");

        Ok(IssuedTokens {
            access_token,
            access_expires_at: access.exp,
            refresh_token,
            refresh_expires_at: refresh.exp,
        })
    }

    /// Exchange a valid refresh token for a new token pair for the same user
    ///
    /// # Errors
    /// Returns `Error::TokenVerify` if the refresh token is invalid, expired or
    /// not a refresh token, and `Error::TokenIssue` if signing fails
    pub fn refresh(&self, refresh_token: &str) -> Result<IssuedTokens> {
        self.refresh_at(refresh_token, Utc::now())
    }

    /// Exchange a refresh token as if the current time were `now`
    ///
    /// # Errors
    /// See [`SessionTokenIssuer::refresh`]
    pub fn refresh_at(&self, refresh_token: &str, now: DateTime<Utc>) -> Result<IssuedTokens> {
        let claims = self.verifier.verify_refresh_at(refresh_token, now)?;
        Ok(self.issue_at(claims.user_id, claims.email.as_deref(), now)?)
    }

    fn claims(
        &self,
        user_id: UserId,
        email: Option<&str>,
        now: DateTime<Utc>,
        token_type: TokenType,
    ) -> SessionClaims {
        let lifetime = match token_type {
            TokenType::Access => self.access_lifetime,
            TokenType::Refresh => self.refresh_lifetime,
        };
        let iat = now.timestamp();

        SessionClaims {
            user_id,
            email: email.filter(|email| !email.is_empty()).map(str::to_string),
            iat,
            exp: iat.saturating_add(i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX)),
            iss: self.issuer.clone(),
            typ: token_type,
        }
    }
}

fn sign(claims: &SessionClaims, key: &EncodingKey) -> Result<String, TokenIssueError> {
    encode(&Header::new(Algorithm::HS256), claims, key).map_err(|source| TokenIssueError {
        token_type: claims.typ,
        source,
    })
}
