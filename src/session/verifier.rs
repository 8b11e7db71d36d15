use chrono::DateTime;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use secrecy::ExposeSecret;

use super::SessionClaims;
use super::TokenType;
use super::UserId;
use crate::config::SessionConfig;
use crate::error::TokenParseError;
use crate::error::TokenVerifyError;
use crate::signature::signature_only_validation;

/// Verifies session tokens issued by [`SessionTokenIssuer`](super::SessionTokenIssuer)
///
/// Signature, token type and expiry are checked together; there is no way to
/// read the claims of a token without verifying it.
pub struct SessionTokenVerifier {
    access_key: DecodingKey,
    refresh_key: DecodingKey,
}

impl SessionTokenVerifier {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            access_key: DecodingKey::from_secret(config.access_secret.expose_secret().as_bytes()),
            refresh_key: DecodingKey::from_secret(
                config.refresh_secret().expose_secret().as_bytes(),
            ),
        }
    }

    /// Verify an access token and return its claims
    ///
    /// # Errors
    /// See [`SessionTokenVerifier::verify_at`]
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenVerifyError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify an access token as if the current time were `now`
    ///
    /// # Errors
    /// - `TokenVerifyError::Malformed` if the token cannot be decoded
    /// - `TokenVerifyError::InvalidSignature` if it was not signed with the access secret
    /// - `TokenVerifyError::WrongTokenType` if it is a refresh token
    /// - `TokenVerifyError::Expired` if `exp` is not after `now`
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionClaims, TokenVerifyError> {
        decode_session(token, &self.access_key, TokenType::Access, now)
    }

    /// Verify a refresh token and return its claims
    ///
    /// # Errors
    /// Same as [`SessionTokenVerifier::verify_at`], with the roles of the token types swapped
    pub fn verify_refresh(&self, token: &str) -> Result<SessionClaims, TokenVerifyError> {
        self.verify_refresh_at(token, Utc::now())
    }

    /// Verify a refresh token as if the current time were `now`
    ///
    /// # Errors
    /// See [`SessionTokenVerifier::verify_refresh`]
    pub fn verify_refresh_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionClaims, TokenVerifyError> {
        decode_session(token, &self.refresh_key, TokenType::Refresh, now)
    }

    /// Verify an access token and extract the user it belongs to
    ///
    /// # Errors
    /// Returns `TokenParseError::Unverified` if verification fails
    pub fn parse(&self, token: &str) -> Result<(UserId, Option<String>), TokenParseError> {
        self.parse_at(token, Utc::now())
    }

    /// Verify and extract as if the current time were `now`
    ///
    /// # Errors
    /// See [`SessionTokenVerifier::parse`]
    pub fn parse_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(UserId, Option<String>), TokenParseError> {
        let claims = self.verify_at(token, now)?;
        Ok((claims.user_id, claims.email))
    }
}

fn decode_session(
    token: &str,
    key: &DecodingKey,
    expected: TokenType,
    now: DateTime<Utc>,
) -> Result<SessionClaims, TokenVerifyError> {
    let validation = signature_only_validation(Algorithm::HS256);

    let claims = decode::<SessionClaims>(token, key, &validation)
        .map_err(|error| match error.kind() {
            ErrorKind::InvalidSignature => TokenVerifyError::InvalidSignature,
            _ => TokenVerifyError::Malformed(error.to_string()),
        })?
        .claims;

    if claims.typ != expected {
        return Err(TokenVerifyError::WrongTokenType {
            expected,
            found: claims.typ,
        });
    }

    if claims.exp <= now.timestamp() {
        return Err(TokenVerifyError::Expired(claims.exp));
    }

    Ok(claims)
}
