use chrono::DateTime;
use chrono::Utc;
use serde_json::Map;
use serde_json::Value;

use crate::config::TrustConfig;
use crate::error::ClaimsError;

/// Claims of a token whose signature has been verified
///
/// Only [`SignatureVerifier`](crate::SignatureVerifier) produces this type, so
/// holding one means the signature checked out. Nothing about issuer, audience
/// or expiry has been validated yet.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedClaims {
    claims: Map<String, Value>,
}

impl VerifiedClaims {
    pub(crate) fn from_map(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    /// Get any claim by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// Get the issuer (iss) claim
    pub fn iss(&self) -> Option<&str> {
        self.str_claim("iss")
    }

    /// Get the subject (sub) claim
    pub fn sub(&self) -> Option<&str> {
        self.str_claim("sub")
    }

    /// Get the email claim
    pub fn email(&self) -> Option<&str> {
        self.str_claim("email")
    }

    /// Get the audience (aud) claim, which may be a single string or an array
    pub fn aud(&self) -> Vec<&str> {
        match self.claims.get("aud") {
            Some(Value::String(aud)) => vec![aud.as_str()],
            Some(Value::Array(auds)) => auds.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Get the expiration time (exp) claim as a Unix timestamp
    pub fn exp(&self) -> Option<i64> {
        let exp = self.claims.get("exp")?;
        exp.as_i64().or_else(|| exp.as_f64().map(|exp| exp as i64))
    }

    fn str_claim(&self, name: &str) -> Option<&str> {
        self.claims
            .get(name)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// Enforces a provider's issuer, audience and expiry policy on verified claims
///
/// Any failed check rejects the whole token.
pub struct ClaimsValidator;

impl ClaimsValidator {
    /// Validate `claims` against `config` at the current time
    ///
    /// # Errors
    /// See [`ClaimsValidator::validate_at`]
    pub fn validate(claims: &VerifiedClaims, config: &TrustConfig) -> Result<(), ClaimsError> {
        Self::validate_at(claims, config, Utc::now())
    }

    /// Validate `claims` against `config` as if the current time were `now`
    ///
    /// # Errors
    /// - `ClaimsError::MissingClaim` if `sub`, `iss`, `aud`, `exp` or a required `email` is absent
    /// - `ClaimsError::IssuerMismatch` if the issuer is not allowed
    /// - `ClaimsError::AudienceMismatch` if no audience is allowed
    /// - `ClaimsError::Expired` if `exp` (plus the configured leeway) is not after `now`
    pub fn validate_at(
        claims: &VerifiedClaims,
        config: &TrustConfig,
        now: DateTime<Utc>,
    ) -> Result<(), ClaimsError> {
        claims.sub().ok_or(ClaimsError::MissingClaim("sub"))?;
        let issuer = claims.iss().ok_or(ClaimsError::MissingClaim("iss"))?;
        let audiences = claims.aud();
        if audiences.is_empty() {
            return Err(ClaimsError::MissingClaim("aud"));
        }
        let exp = claims.exp().ok_or(ClaimsError::MissingClaim("exp"))?;
        if config.require_email && claims.email().is_none() {
            return Err(ClaimsError::MissingClaim("email"));
        }

        if !issuer_allowed(issuer, config) {
            return Err(ClaimsError::IssuerMismatch(issuer.to_string()));
        }

        if !audiences
            .iter()
            .any(|aud| config.allowed_audiences.contains(*aud))
        {
            return Err(ClaimsError::AudienceMismatch(
                audiences.into_iter().map(str::to_string).collect(),
            ));
        }

        let leeway = i64::try_from(config.leeway.as_secs()).unwrap_or(i64::MAX);
        if exp.saturating_add(leeway) <= now.timestamp() {
            return Err(ClaimsError::Expired(exp));
        }

        Ok(())
    }
}

fn issuer_allowed(issuer: &str, config: &TrustConfig) -> bool {
    if config.allowed_issuers.contains(issuer) {
        return true;
    }

    if !config.issuer_scheme_variants {
        return false;
    }

    let bare = strip_scheme(issuer);
    config
        .allowed_issuers
        .iter()
        .any(|allowed| strip_scheme(allowed) == bare)
}

fn strip_scheme(issuer: &str) -> &str {
    issuer
        .strip_prefix("https://")
        .or_else(|| issuer.strip_prefix("http://"))
        .unwrap_or(issuer)
}
