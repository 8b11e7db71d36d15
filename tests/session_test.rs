use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use federauth::{
    Error, SessionConfig, SessionTokenIssuer, SessionTokenVerifier, TokenParseError, TokenType,
    TokenVerifyError,
};

const HOUR: i64 = 3600;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn at(offset_secs: i64) -> DateTime<Utc> {
    t0() + chrono::Duration::seconds(offset_secs)
}

fn session_pair(config: &SessionConfig) -> (SessionTokenIssuer, SessionTokenVerifier) {
    (SessionTokenIssuer::new(config), SessionTokenVerifier::new(config))
}

#[test]
fn issued_access_token_verifies_and_parses() {
    let (issuer, verifier) = session_pair(&SessionConfig::new("session-secret"));
    let tokens = issuer.issue(42, Some("user@example.com")).unwrap();

    let claims = verifier.verify(&tokens.access_token).unwrap();
    assert_eq!(claims.user_id, 42);
    assert_eq!(claims.email.as_deref(), Some("user@example.com"));
    assert_eq!(claims.typ, TokenType::Access);
    assert_eq!(claims.iss, "federauth");

    let (user_id, email) = verifier.parse(&tokens.access_token).unwrap();
    assert_eq!(user_id, 42);
    assert_eq!(email.as_deref(), Some("user@example.com"));
}

#[test]
fn access_token_lives_one_day() {
    let (issuer, verifier) = session_pair(&SessionConfig::new("session-secret"));
    let tokens = issuer.issue_at(7, None, t0()).unwrap();

    assert!(verifier.verify_at(&tokens.access_token, at(23 * HOUR)).is_ok());
    assert!(matches!(
        verifier.verify_at(&tokens.access_token, at(25 * HOUR)),
        Err(TokenVerifyError::Expired(exp)) if exp == at(24 * HOUR).timestamp()
    ));
}

#[test]
fn token_is_expired_at_its_expiry_second() {
    let (issuer, verifier) = session_pair(&SessionConfig::new("session-secret"));
    let tokens = issuer.issue_at(7, None, t0()).unwrap();

    assert!(verifier
        .verify_at(&tokens.access_token, at(24 * HOUR - 1))
        .is_ok());
    assert!(matches!(
        verifier.verify_at(&tokens.access_token, at(24 * HOUR)),
        Err(TokenVerifyError::Expired(_))
    ));
}

#[test]
fn refresh_token_lives_one_week() {
    let (issuer, verifier) = session_pair(&SessionConfig::new("session-secret"));
    let tokens = issuer.issue_at(7, None, t0()).unwrap();

    assert!(verifier
        .verify_refresh_at(&tokens.refresh_token, at(6 * 24 * HOUR))
        .is_ok());
    assert!(matches!(
        verifier.verify_refresh_at(&tokens.refresh_token, at(8 * 24 * HOUR)),
        Err(TokenVerifyError::Expired(_))
    ));
}

#[test]
fn configured_lifetimes_are_applied() {
    let config = SessionConfig::new("session-secret")
        .with_access_lifetime(Duration::from_secs(15 * 60))
        .with_refresh_lifetime(Duration::from_secs(30 * 24 * 3600))
        .with_issuer("api.example.com");
    let (issuer, verifier) = session_pair(&config);

    let tokens = issuer.issue_at(7, None, t0()).unwrap();
    assert_eq!(tokens.access_expires_at, at(15 * 60).timestamp());
    assert_eq!(tokens.refresh_expires_at, at(30 * 24 * HOUR).timestamp());

    let claims = verifier.verify_at(&tokens.access_token, at(60)).unwrap();
    assert_eq!(claims.iss, "api.example.com");
}

#[test]
fn token_types_are_not_interchangeable() {
    let (issuer, verifier) = session_pair(&SessionConfig::new("session-secret"));
    let tokens = issuer.issue_at(7, None, t0()).unwrap();

    assert!(matches!(
        verifier.verify_at(&tokens.refresh_token, at(60)),
        Err(TokenVerifyError::WrongTokenType {
            expected: TokenType::Access,
            found: TokenType::Refresh,
        })
    ));
    assert!(matches!(
        verifier.verify_refresh_at(&tokens.access_token, at(60)),
        Err(TokenVerifyError::WrongTokenType {
            expected: TokenType::Refresh,
            found: TokenType::Access,
        })
    ));
}

#[test]
fn distinct_refresh_secret_signs_refresh_tokens() {
    let config = SessionConfig::new("access-secret").with_refresh_secret("refresh-secret");
    let (issuer, verifier) = session_pair(&config);
    let tokens = issuer.issue_at(7, None, t0()).unwrap();

    assert!(verifier.verify_refresh_at(&tokens.refresh_token, at(60)).is_ok());

    // A verifier that only knows the access secret cannot check refresh tokens
    let shared_only = SessionTokenVerifier::new(&SessionConfig::new("access-secret"));
    assert!(matches!(
        shared_only.verify_refresh_at(&tokens.refresh_token, at(60)),
        Err(TokenVerifyError::InvalidSignature)
    ));
}

#[test]
fn refresh_exchanges_for_a_new_pair() {
    let (issuer, verifier) = session_pair(&SessionConfig::new("session-secret"));
    let original = issuer.issue_at(7, Some("user@example.com"), t0()).unwrap();

    let later = at(2 * 24 * HOUR);
    let rotated = issuer.refresh_at(&original.refresh_token, later).unwrap();

    assert_eq!(rotated.access_expires_at, later.timestamp() + 24 * HOUR);
    let (user_id, email) = verifier.parse_at(&rotated.access_token, later).unwrap();
    assert_eq!(user_id, 7);
    assert_eq!(email.as_deref(), Some("user@example.com"));
}

#[test]
fn refresh_with_access_token_fails() {
    let (issuer, _) = session_pair(&SessionConfig::new("session-secret"));
    let tokens = issuer.issue_at(7, None, t0()).unwrap();

    let result = issuer.refresh_at(&tokens.access_token, at(60));
    assert!(matches!(
        result,
        Err(Error::TokenVerify(TokenVerifyError::WrongTokenType { .. }))
    ));
}

#[test]
fn token_signed_with_another_secret_is_rejected() {
    let issuer = SessionTokenIssuer::new(&SessionConfig::new("someone-else"));
    let verifier = SessionTokenVerifier::new(&SessionConfig::new("session-secret"));
    let tokens = issuer.issue_at(7, None, t0()).unwrap();

    assert!(matches!(
        verifier.verify_at(&tokens.access_token, at(60)),
        Err(TokenVerifyError::InvalidSignature)
    ));
}

#[test]
fn tampered_claims_are_rejected() {
    let (issuer, verifier) = session_pair(&SessionConfig::new("session-secret"));
    let victim = issuer.issue_at(7, None, t0()).unwrap().access_token;
    let attacker = issuer.issue_at(8, None, t0()).unwrap().access_token;

    let victim_parts: Vec<&str> = victim.split('.').collect();
    let attacker_parts: Vec<&str> = attacker.split('.').collect();
    let forged = format!("{}.{}.{}", attacker_parts[0], victim_parts[1], attacker_parts[2]);

    assert!(matches!(
        verifier.verify_at(&forged, at(60)),
        Err(TokenVerifyError::InvalidSignature)
    ));
}

#[test]
fn parse_never_returns_claims_of_unverified_tokens() {
    let (issuer, verifier) = session_pair(&SessionConfig::new("session-secret"));
    let tokens = issuer.issue_at(7, None, t0()).unwrap();

    assert!(matches!(
        verifier.parse_at(&tokens.access_token, at(25 * HOUR)),
        Err(TokenParseError::Unverified(TokenVerifyError::Expired(_)))
    ));
    assert!(matches!(
        verifier.parse("definitely.not.valid"),
        Err(TokenParseError::Unverified(TokenVerifyError::Malformed(_)))
    ));
    assert!(matches!(
        verifier.parse(""),
        Err(TokenParseError::Unverified(TokenVerifyError::Malformed(_)))
    ));
}
