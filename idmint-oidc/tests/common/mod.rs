#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use chrono::{Duration, NaiveDate};
use idmint_core::claims::ClaimsMap;
use idmint_core::{AccessToken, AuthorizationContext, MintConfig, User};
use idmint_oidc::{IdTokenMinter, InMemoryUserStore, JwtTokenCodec, SigningKeys, TokenCodec};

pub const TEST_SECRET: &[u8] = b"idmint-test-secret-do-not-use-in-production";
pub const TEST_ISSUER: &str = "https://id.example.com";
pub const CLIENT_ID: &str = "client-a";

pub fn config() -> MintConfig {
    MintConfig {
        issuer: TEST_ISSUER.into(),
        ..MintConfig::default()
    }
}

pub fn hs256_codec() -> JwtTokenCodec {
    idmint_core::logging::init_tracing();
    let config = config();
    JwtTokenCodec::from_config(Arc::new(SigningKeys::hmac(TEST_SECRET, &config.kid)), &config)
}

/// RSA key generation is slow, so one key pair is shared per test binary.
pub fn rs256_codec() -> JwtTokenCodec {
    static KEYS: OnceLock<Arc<SigningKeys>> = OnceLock::new();
    idmint_core::logging::init_tracing();
    let config = config();
    let keys = KEYS
        .get_or_init(|| Arc::new(SigningKeys::generate_rsa(&config.kid).unwrap()))
        .clone();
    JwtTokenCodec::from_config(keys, &config)
}

pub fn alice() -> User {
    User {
        username: "alice".into(),
        given_name: Some("Alice".into()),
        family_name: Some("Liddell".into()),
        birthdate: NaiveDate::from_ymd_opt(1852, 5, 4),
        email: Some("alice@example.com".into()),
        email_verified: true,
        ..Default::default()
    }
}

pub fn users() -> InMemoryUserStore {
    InMemoryUserStore::new().add_user(alice())
}

pub fn context(scopes: &[&str]) -> AuthorizationContext {
    AuthorizationContext::new(CLIENT_ID)
        .with_scope(scopes.iter().copied())
        .with_principal("alice")
}

pub fn minter(codec: JwtTokenCodec) -> IdTokenMinter<InMemoryUserStore, JwtTokenCodec> {
    IdTokenMinter::new(users(), codec).with_config(&config())
}

pub fn access_token(codec: &JwtTokenCodec, context: &AuthorizationContext) -> AccessToken {
    codec
        .issue_access_token(context, Duration::hours(1))
        .unwrap()
}

/// Decode the identity token attached to `token`.
pub fn id_token_claims(codec: &JwtTokenCodec, token: &AccessToken) -> ClaimsMap {
    let encoded = token.additional_information()["id_token"]
        .as_str()
        .expect("id_token entry is a string");
    codec.decode(encoded).unwrap()
}
