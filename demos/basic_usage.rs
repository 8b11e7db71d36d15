use std::sync::Arc;
use std::time::Duration;

use federauth::providers::google::GoogleProvider;
use federauth::providers::kakao::KakaoProvider;
use federauth::{
    GoogleExtractor, IdentityAssertion, IntrospectionConfig, PayloadCipher, ProviderKind,
    ProviderRegistry, SessionConfig, SessionTokenIssuer, SessionTokenVerifier, TrustConfig,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Example 1: Register one provider per supported tag
    println!("=== Example 1: Provider Registry ===");
    let google_config = TrustConfig::google(vec![
        "1234-ios.apps.googleusercontent.com".to_string(),
        "1234-android.apps.googleusercontent.com".to_string(),
    ])?
    .with_cache_ttl(Duration::from_secs(1800));

    let registry = ProviderRegistry::new()
        .with(Arc::new(GoogleProvider::new(google_config, GoogleExtractor)))
        .with(Arc::new(KakaoProvider::new(IntrospectionConfig::kakao("123456")?)));

    // Placeholder token, use a real one from the client in practice
    let provider: ProviderKind = "google".parse()?;
    let assertion = IdentityAssertion::new(provider, "eyJhbGciOiJSUzI1NiIsImtpZCI6Ii4uLiJ9...");

    let identity = match registry.validate(&assertion).await {
        Ok(identity) => {
            println!("✓ Identity verified!");
            println!("  Provider: {}", identity.provider());
            println!("  External id: {}", identity.external_id());
            println!("  Email: {:?}", identity.email());
            Some(identity)
        }
        Err(e) if e.is_provider_unavailable() => {
            eprintln!("✗ {provider} is unavailable, try again later: {e}");
            None
        }
        Err(e) => {
            eprintln!("✗ Identity verification failed: {e}");
            None
        }
    };

    println!();

    // Example 2: Session tokens for the local user
    println!("=== Example 2: Session Tokens ===");
    let session = SessionConfig::new("change-me").with_refresh_secret("change-me-too");
    let issuer = SessionTokenIssuer::new(&session);
    let verifier = SessionTokenVerifier::new(&session);

    let email = identity.as_ref().and_then(|identity| identity.email());
    let tokens = issuer.issue(42, email)?;
    println!("  Issued {tokens:?}");

    let (user_id, email) = verifier.parse(&tokens.access_token)?;
    println!("✓ Access token belongs to user {user_id} ({email:?})");

    let rotated = issuer.refresh(&tokens.refresh_token)?;
    println!("✓ Refreshed, new access token expires at {}", rotated.access_expires_at);

    println!();

    // Example 3: Sealing a provider id for a sign-up round trip
    println!("=== Example 3: Payload Cipher ===");
    let cipher = PayloadCipher::from_hex(
        "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f",
    )?;
    let sealed = cipher.seal(b"kakao:123456789")?;
    let opened = cipher.open(&sealed)?;
    println!("  Sealed: {sealed}");
    println!("  Opened: {}", String::from_utf8_lossy(&opened));

    Ok(())
}
