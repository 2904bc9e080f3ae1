//! Conversion between token objects and their wire claim sets.
//!
//! Access tokens go through a pure default shape followed by an explicit,
//! ordered list of named [`ClaimsAdjustment`] steps. Identity tokens bypass
//! both and emit the OIDC claim set directly.

use chrono::Utc;
use idmint_core::claims::{
    epoch_seconds, insert_opt, instant_claim, names, string_claim, string_set_claim,
    without_nulls, ClaimsMap,
};
use idmint_core::{AccessToken, AuthorizationContext};
use serde_json::Value;
use tracing::{debug, warn};

use crate::id_token::IdentityToken;

/// Claims the identity-token path owns. Enhancer claims never override these.
const RESERVED_ID_CLAIMS: &[&str] = &[
    names::ISSUER,
    names::SUBJECT,
    names::AUDIENCE,
    names::EXPIRATION,
    names::ISSUED_AT,
    names::AUTH_TIME,
    names::NONCE,
    names::AUTHORIZED_PARTY,
    names::ACCESS_TOKEN_HASH,
    names::CODE_HASH,
    names::AUTH_METHODS,
];

/// Claims produced by the default access-token shape. They are rebuilt from
/// token metadata on extraction and so never land in extra-information.
const SHAPE_CLAIMS: &[&str] = &[
    names::EXPIRATION,
    names::AUDIENCE,
    names::SCOPE,
    names::CLIENT_ID,
    names::USER_NAME,
];

/// A token handed to the converter.
#[derive(Clone, Copy, Debug)]
pub enum IssuedToken<'a> {
    Access(&'a AccessToken),
    Identity(&'a IdentityToken),
}

/// A named step applied to the default access-token claim shape.
pub trait ClaimsAdjustment: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        claims: ClaimsMap,
        token: &AccessToken,
        context: &AuthorizationContext,
    ) -> ClaimsMap;

    /// Claims this step may add. They are dropped again when a token is
    /// rebuilt from its wire claims.
    fn derived_claims(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Adds `iss`, `sub` (the principal, else the client) and `iat` when absent.
#[derive(Debug, Clone)]
pub struct IssuerClaims {
    issuer: String,
}

impl IssuerClaims {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }
}

impl ClaimsAdjustment for IssuerClaims {
    fn name(&self) -> &'static str {
        "issuer-claims"
    }

    fn derived_claims(&self) -> &'static [&'static str] {
        &[names::ISSUER, names::SUBJECT, names::ISSUED_AT]
    }

    fn apply(
        &self,
        mut claims: ClaimsMap,
        _token: &AccessToken,
        context: &AuthorizationContext,
    ) -> ClaimsMap {
        claims
            .entry(names::ISSUER)
            .or_insert_with(|| Value::from(self.issuer.clone()));
        let subject = context
            .principal
            .clone()
            .unwrap_or_else(|| context.client_id.clone());
        claims
            .entry(names::SUBJECT)
            .or_insert_with(|| Value::from(subject));
        claims
            .entry(names::ISSUED_AT)
            .or_insert_with(|| epoch_seconds(Utc::now()));
        claims
    }
}

/// Default claim shape of an access token: extra-information entries,
/// `scope`, `exp`, `user_name` and `client_id`.
pub fn default_access_claims(token: &AccessToken, context: &AuthorizationContext) -> ClaimsMap {
    let mut claims = token.additional_information().clone();
    claims.insert(
        names::SCOPE.into(),
        Value::from(token.scope().iter().cloned().collect::<Vec<_>>()),
    );
    insert_opt(&mut claims, names::EXPIRATION, token.expiration().map(epoch_seconds));
    insert_opt(&mut claims, names::USER_NAME, context.principal.clone());
    claims.insert(names::CLIENT_ID.into(), Value::from(context.client_id.clone()));
    claims
}

/// OIDC claim set of an identity token.
pub fn identity_claims(token: &IdentityToken) -> ClaimsMap {
    let mut claims = ClaimsMap::new();
    claims.insert(names::ISSUER.into(), Value::from(token.issuer()));
    claims.insert(names::SUBJECT.into(), Value::from(token.subject()));
    claims.insert(
        names::AUDIENCE.into(),
        Value::from(token.audience().iter().cloned().collect::<Vec<_>>()),
    );
    claims.insert(names::EXPIRATION.into(), epoch_seconds(token.expires_at()));
    claims.insert(names::ISSUED_AT.into(), epoch_seconds(token.issued_at()));
    claims.insert(names::AUTH_TIME.into(), epoch_seconds(token.auth_time()));
    insert_opt(&mut claims, names::NONCE, token.nonce());
    claims.insert(
        names::AUTHORIZED_PARTY.into(),
        Value::from(token.authorized_party()),
    );
    insert_opt(&mut claims, names::ACCESS_TOKEN_HASH, token.access_token_hash());
    insert_opt(&mut claims, names::CODE_HASH, token.authorization_code_hash());
    if !token.authentication_methods().is_empty() {
        claims.insert(
            names::AUTH_METHODS.into(),
            Value::from(token.authentication_methods().to_vec()),
        );
    }

    for (k, v) in token.claims() {
        if RESERVED_ID_CLAIMS.contains(&k.as_str()) {
            warn!(claim = %k, "Ignoring reserved claim in identity token claims");
        } else {
            claims.insert(k.clone(), v.clone());
        }
    }
    without_nulls(claims)
}

/// Copy of `claims` with `sub` renamed to `user_name` and, when no
/// `client_id` is present, `azp` promoted to `client_id`.
pub fn normalize_principal_claims(claims: &ClaimsMap) -> ClaimsMap {
    let mut normalized = claims.clone();
    if let Some(subject) = normalized.remove(names::SUBJECT) {
        normalized.insert(names::USER_NAME.into(), subject);
    }
    if !normalized.contains_key(names::CLIENT_ID) {
        if let Some(azp) = normalized.get(names::AUTHORIZED_PARTY).cloned() {
            normalized.insert(names::CLIENT_ID.into(), azp);
        }
    }
    normalized
}

/// Converts tokens to and from wire claims.
#[derive(Default)]
pub struct TokenClaimsConverter {
    adjustments: Vec<Box<dyn ClaimsAdjustment>>,
}

impl TokenClaimsConverter {
    /// A converter with no adjustment steps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an adjustment step. Steps run in the order they were added.
    pub fn with_adjustment(mut self, adjustment: impl ClaimsAdjustment + 'static) -> Self {
        self.adjustments.push(Box::new(adjustment));
        self
    }

    /// Names of the configured adjustment steps, in order.
    pub fn adjustment_names(&self) -> Vec<&'static str> {
        self.adjustments.iter().map(|a| a.name()).collect()
    }

    /// Wire claims for `token`. Never contains null values.
    pub fn to_wire_claims(&self, token: IssuedToken<'_>, context: &AuthorizationContext) -> ClaimsMap {
        match token {
            IssuedToken::Identity(id_token) => identity_claims(id_token),
            IssuedToken::Access(access) => {
                let mut claims = default_access_claims(access, context);
                for adjustment in &self.adjustments {
                    debug!(step = adjustment.name(), "Applying claims adjustment");
                    claims = adjustment.apply(claims, access, context);
                }
                without_nulls(claims)
            }
        }
    }

    /// Rebuild an access token from its wire value and converted claims.
    ///
    /// Extra-information keeps every claim except the shape claims, `iss`
    /// and the claims derived by the adjustment steps.
    pub fn from_wire_claims(&self, value: &str, claims: &ClaimsMap) -> AccessToken {
        let mut token = AccessToken::bearer(value).with_scope(string_set_claim(claims, names::SCOPE));
        if let Some(exp) = instant_claim(claims, names::EXPIRATION) {
            token = token.with_expiration(exp);
        }
        for (k, v) in claims {
            if k == names::ISSUER || SHAPE_CLAIMS.contains(&k.as_str()) || self.is_derived(k) {
                continue;
            }
            token.insert_information(k.clone(), v.clone());
        }
        token
    }

    fn is_derived(&self, claim: &str) -> bool {
        self.adjustments
            .iter()
            .any(|a| a.derived_claims().contains(&claim))
    }

    /// Authorization context recovered from a claims map. The input is not
    /// modified.
    pub fn extract_authorization_context(&self, claims: &ClaimsMap) -> AuthorizationContext {
        let claims = normalize_principal_claims(claims);
        let mut context = AuthorizationContext::new(
            string_claim(&claims, names::CLIENT_ID).unwrap_or_default(),
        )
        .with_scope(string_set_claim(&claims, names::SCOPE));

        context.principal = string_claim(&claims, names::USER_NAME);
        if let Some(Value::Array(methods)) = claims.get(names::AUTH_METHODS) {
            context.authentication_methods = methods
                .iter()
                .filter_map(|m| m.as_str().map(String::from))
                .collect();
        }
        if let Some(grant_type) = string_claim(&claims, names::GRANT_TYPE) {
            context
                .request_parameters
                .insert(names::GRANT_TYPE.into(), grant_type);
        }
        if context.client_id.is_empty() {
            debug!("Claims carry no client identity");
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn map(value: Value) -> ClaimsMap {
        value.as_object().cloned().unwrap()
    }

    fn context() -> AuthorizationContext {
        AuthorizationContext::new("client-a")
            .with_scope(["openid", "read"])
            .with_principal("alice")
    }

    fn access_token() -> AccessToken {
        AccessToken::bearer("opaque-value")
            .with_expiration(Utc.timestamp_opt(1_900_000_000, 0).unwrap())
            .with_scope(["openid", "read"])
            .with_information("jti", "token-1")
            .with_information("tenant", "acme")
    }

    fn id_token() -> IdentityToken {
        IdentityToken::builder()
            .issuer("https://id.example")
            .subject("alice")
            .audience(["client-a"])
            .expires_at(Utc.timestamp_opt(1_900_000_000, 0).unwrap())
            .issued_at(Utc.timestamp_opt(1_800_000_000, 0).unwrap())
            .authorized_party("client-a")
            .access_token_hash("hash")
            .build()
            .unwrap()
    }

    #[test]
    fn default_shape() {
        let claims = default_access_claims(&access_token(), &context());
        assert_eq!(claims["scope"], json!(["openid", "read"]));
        assert_eq!(claims["exp"], 1_900_000_000);
        assert_eq!(claims["user_name"], "alice");
        assert_eq!(claims["client_id"], "client-a");
        assert_eq!(claims["jti"], "token-1");
        assert!(!claims.contains_key("iss"));
    }

    #[test]
    fn client_only_grant_has_no_user_name() {
        let ctx = AuthorizationContext::new("svc");
        let claims = default_access_claims(&AccessToken::bearer("v"), &ctx);
        assert!(!claims.contains_key("user_name"));
        assert!(!claims.contains_key("exp"));
    }

    #[test]
    fn issuer_adjustment_fills_missing_claims_only() {
        let converter = TokenClaimsConverter::new().with_adjustment(IssuerClaims::new("https://id.example"));
        assert_eq!(converter.adjustment_names(), vec!["issuer-claims"]);

        let claims = converter.to_wire_claims(IssuedToken::Access(&access_token()), &context());
        assert_eq!(claims["iss"], "https://id.example");
        assert_eq!(claims["sub"], "alice");
        assert!(claims["iat"].is_i64());

        let token = access_token().with_information("iss", "https://other.example");
        let claims = converter.to_wire_claims(IssuedToken::Access(&token), &context());
        assert_eq!(claims["iss"], "https://other.example");
    }

    #[test]
    fn issuer_adjustment_uses_client_when_no_principal() {
        let converter = TokenClaimsConverter::new().with_adjustment(IssuerClaims::new("https://id.example"));
        let ctx = AuthorizationContext::new("svc");
        let claims = converter.to_wire_claims(IssuedToken::Access(&AccessToken::bearer("v")), &ctx);
        assert_eq!(claims["sub"], "svc");
    }

    struct Nulling;

    impl ClaimsAdjustment for Nulling {
        fn name(&self) -> &'static str {
            "nulling"
        }

        fn apply(&self, mut claims: ClaimsMap, _: &AccessToken, _: &AuthorizationContext) -> ClaimsMap {
            claims.insert("tenant".into(), Value::Null);
            claims
        }
    }

    #[test]
    fn null_values_never_reach_the_wire() {
        let converter = TokenClaimsConverter::new().with_adjustment(Nulling);
        let token = access_token().with_information("dangling", Value::Null);
        let claims = converter.to_wire_claims(IssuedToken::Access(&token), &context());
        assert!(!claims.contains_key("tenant"));
        assert!(!claims.contains_key("dangling"));
        assert!(claims.values().all(|v| !v.is_null()));
    }

    #[test]
    fn identity_path_bypasses_access_shaping() {
        let converter = TokenClaimsConverter::new().with_adjustment(Nulling);
        let claims = converter.to_wire_claims(IssuedToken::Identity(&id_token()), &context());
        assert_eq!(claims["iss"], "https://id.example");
        assert_eq!(claims["aud"], json!(["client-a"]));
        assert_eq!(claims["azp"], "client-a");
        assert_eq!(claims["at_hash"], "hash");
        assert_eq!(claims["exp"], 1_900_000_000);
        assert_eq!(claims["iat"], 1_800_000_000);
        assert_eq!(claims["auth_time"], 1_800_000_000);
        assert!(!claims.contains_key("scope"));
        assert!(!claims.contains_key("client_id"));
        assert!(!claims.contains_key("nonce"));
        assert!(!claims.contains_key("c_hash"));
    }

    #[test]
    fn identity_extra_claims_cannot_override_reserved() {
        let token = IdentityToken::builder()
            .issuer("https://id.example")
            .subject("alice")
            .audience(["client-a"])
            .expires_at(Utc::now())
            .authorized_party("client-a")
            .claims(map(json!({"sub": "mallory", "email": "alice@example.com", "gone": null})))
            .build()
            .unwrap();
        let claims = identity_claims(&token);
        assert_eq!(claims["sub"], "alice");
        assert_eq!(claims["email"], "alice@example.com");
        assert!(!claims.contains_key("gone"));
    }

    #[test]
    fn wire_round_trip_keeps_value_and_information_but_strips_issuer() {
        let converter = TokenClaimsConverter::new();
        let token = access_token().with_information("iss", "https://id.example");
        let claims = converter.to_wire_claims(IssuedToken::Access(&token), &context());
        assert_eq!(claims["iss"], "https://id.example");

        let extracted = converter.from_wire_claims(token.value(), &claims);
        assert_eq!(extracted.value(), "opaque-value");
        assert_eq!(extracted.expiration(), token.expiration());
        assert_eq!(extracted.scope(), token.scope());
        assert!(!extracted.additional_information().contains_key("iss"));

        let mut expected = token.additional_information().clone();
        expected.remove("iss");
        assert_eq!(extracted.additional_information(), &expected);
    }

    #[test]
    fn wire_round_trip_with_issuer_claims_drops_derived_claims() {
        let converter = TokenClaimsConverter::new().with_adjustment(IssuerClaims::new("https://id.example"));
        let token = AccessToken::bearer("v").with_information("tenant", "acme");
        let claims = converter.to_wire_claims(IssuedToken::Access(&token), &context());
        assert_eq!(claims["sub"], "alice");
        assert!(claims.contains_key("iat"));
        assert_eq!(claims["user_name"], "alice");

        let extracted = converter.from_wire_claims(token.value(), &claims);
        assert_eq!(extracted.additional_information(), token.additional_information());

        let again = converter.to_wire_claims(IssuedToken::Access(&extracted), &context());
        let extracted_again = converter.from_wire_claims(extracted.value(), &again);
        assert_eq!(extracted_again.additional_information(), token.additional_information());
    }

    #[test]
    fn from_wire_accepts_space_delimited_scope() {
        let claims = map(json!({"scope": "openid email", "custom": 1}));
        let token = TokenClaimsConverter::new().from_wire_claims("v", &claims);
        assert_eq!(token.scope().len(), 2);
        assert_eq!(token.additional_information()["custom"], 1);
        assert!(token.expiration().is_none());
    }

    #[test]
    fn subject_becomes_user_name() {
        let claims = map(json!({"sub": "alice"}));
        let normalized = normalize_principal_claims(&claims);
        assert_eq!(normalized["user_name"], "alice");
        assert!(!normalized.contains_key("sub"));

        let context = TokenClaimsConverter::new().extract_authorization_context(&claims);
        assert_eq!(context.principal.as_deref(), Some("alice"));
        assert_eq!(context.client_id, "");
    }

    #[test]
    fn azp_is_promoted_only_without_client_id() {
        let claims = map(json!({"sub": "alice", "azp": "client-a"}));
        assert_eq!(normalize_principal_claims(&claims)["client_id"], "client-a");

        let claims = map(json!({"sub": "alice", "azp": "client-a", "client_id": "client-b"}));
        assert_eq!(normalize_principal_claims(&claims)["client_id"], "client-b");
    }

    #[test]
    fn extraction_does_not_mutate_input_and_is_repeatable() {
        let converter = TokenClaimsConverter::new();
        let claims = map(json!({
            "sub": "alice",
            "azp": "client-a",
            "scope": ["openid", "profile"],
            "amr": ["pwd"],
            "grant_type": "authorization_code"
        }));
        let before = claims.clone();

        let first = converter.extract_authorization_context(&claims);
        let second = converter.extract_authorization_context(&claims);
        assert_eq!(claims, before);
        assert_eq!(first, second);
        assert_eq!(first.client_id, "client-a");
        assert!(first.has_scope("profile"));
        assert_eq!(first.authentication_methods, vec!["pwd"]);
        assert_eq!(first.parameter("grant_type"), Some("authorization_code"));
    }
}
