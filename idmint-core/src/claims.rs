//! Wire claim names, scope values and small helpers over [`ClaimsMap`].

use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

/// Mapping from claim name to value. Later inserts overwrite earlier ones.
pub type ClaimsMap = serde_json::Map<String, Value>;

/// Extra-information key carrying the encoded identity token on an access token.
pub const ID_TOKEN_KEY: &str = "id_token";

/// Claim names produced and consumed on the wire (case-sensitive).
pub mod names {
    pub const ISSUER: &str = "iss";
    pub const SUBJECT: &str = "sub";
    pub const AUDIENCE: &str = "aud";
    pub const EXPIRATION: &str = "exp";
    pub const ISSUED_AT: &str = "iat";
    pub const AUTH_TIME: &str = "auth_time";
    pub const NONCE: &str = "nonce";
    pub const AUTHORIZED_PARTY: &str = "azp";
    pub const ACCESS_TOKEN_HASH: &str = "at_hash";
    pub const CODE_HASH: &str = "c_hash";
    pub const AUTH_METHODS: &str = "amr";
    pub const USER_NAME: &str = "user_name";
    pub const CLIENT_ID: &str = "client_id";
    pub const SCOPE: &str = "scope";
    pub const TOKEN_ID: &str = "jti";
    pub const GRANT_TYPE: &str = "grant_type";
}

/// OIDC scope values that gate identity-token claims.
pub mod scopes {
    pub const OPENID: &str = "openid";
    pub const PROFILE: &str = "profile";
    pub const EMAIL: &str = "email";
    pub const ADDRESS: &str = "address";
    pub const PHONE: &str = "phone";
}

/// Request parameter names read from the authorization context.
pub mod params {
    pub const NONCE: &str = "nonce";
    pub const CODE: &str = "code";
}

/// Drop every null-valued entry.
pub fn without_nulls(mut claims: ClaimsMap) -> ClaimsMap {
    claims.retain(|_, v| !v.is_null());
    claims
}

/// Insert `value` under `key` unless it is `None`.
pub fn insert_opt<V: Into<Value>>(claims: &mut ClaimsMap, key: &str, value: Option<V>) {
    if let Some(v) = value {
        claims.insert(key.to_string(), v.into());
    }
}

/// Encode an instant as a NumericDate (seconds since the epoch).
pub fn epoch_seconds(instant: DateTime<Utc>) -> Value {
    Value::from(instant.timestamp())
}

/// Read a NumericDate claim back into an instant.
pub fn instant_claim(claims: &ClaimsMap, key: &str) -> Option<DateTime<Utc>> {
    let secs = match claims.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::String(s) => s.parse().ok()?,
        _ => return None,
    };
    Utc.timestamp_opt(secs, 0).single()
}

/// Read a string claim.
pub fn string_claim(claims: &ClaimsMap, key: &str) -> Option<String> {
    claims.get(key).and_then(Value::as_str).map(String::from)
}

/// Read a set-of-strings claim. Accepts a JSON array or a space-delimited string
/// (the RFC 6749 `scope` encoding).
pub fn string_set_claim(claims: &ClaimsMap, key: &str) -> BTreeSet<String> {
    match claims.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        Some(Value::String(s)) => s.split_whitespace().map(String::from).collect(),
        _ => BTreeSet::new(),
    }
}
