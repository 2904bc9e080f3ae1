use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::claims::{params, ClaimsMap};

/// Kind of token carried on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    #[default]
    Bearer,
    IdToken,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Bearer => "bearer",
            TokenType::IdToken => "id_token",
        }
    }
}

/// A granted OAuth 2.0 access token.
///
/// Immutable once issued, except that extra-information entries may be added.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    value: String,
    token_type: TokenType,
    expiration: Option<DateTime<Utc>>,
    scope: BTreeSet<String>,
    additional_information: ClaimsMap,
}

impl AccessToken {
    /// Create a bearer token with the given wire value.
    pub fn bearer(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            token_type: TokenType::Bearer,
            expiration: None,
            scope: BTreeSet::new(),
            additional_information: ClaimsMap::new(),
        }
    }

    /// Set the expiry instant.
    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Set the granted scopes.
    pub fn with_scope<I, S>(mut self, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = scope.into_iter().map(Into::into).collect();
        self
    }

    /// Add one extra-information entry.
    pub fn with_information(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert_information(key, value);
        self
    }

    /// Replace the wire value, keeping every other field. Used once the token
    /// has been signed into its self-contained form.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Add (or overwrite) an extra-information entry.
    pub fn insert_information(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.additional_information.insert(key.into(), value.into());
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    pub fn scope(&self) -> &BTreeSet<String> {
        &self.scope
    }

    pub fn additional_information(&self) -> &ClaimsMap {
        &self.additional_information
    }
}

/// The resolved record of client, scopes and request parameters for a grant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationContext {
    /// Requesting client.
    pub client_id: String,
    /// Granted scopes.
    pub scope: BTreeSet<String>,
    /// Original request parameters (`nonce`, `code`, `grant_type`, ...).
    pub request_parameters: BTreeMap<String, String>,
    /// Authenticated principal, absent for client-only grants.
    pub principal: Option<String>,
    /// Authentication methods used, in order.
    pub authentication_methods: Vec<String>,
}

impl AuthorizationContext {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    pub fn with_scope<I, S>(mut self, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = scope.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_authentication_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authentication_methods = methods.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.contains(scope)
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.request_parameters.get(name).map(String::as_str)
    }

    /// `nonce` from the original request, passed through unvalidated.
    pub fn nonce(&self) -> Option<&str> {
        self.parameter(params::NONCE)
    }

    /// Authorization code from the original request, if the grant had one.
    pub fn authorization_code(&self) -> Option<&str> {
        self.parameter(params::CODE)
    }
}

/// Postal address (OIDC Core §5.1.1).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// A user record as handed over by the user store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Username, also the token subject.
    pub username: String,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub middle_name: Option<String>,
    pub nickname: Option<String>,
    pub gender: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub zoneinfo: Option<String>,
    pub locale: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub email: Option<String>,
    pub email_verified: bool,
    pub phone_number: Option<String>,
    pub phone_number_verified: bool,
    pub address: Option<Address>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_type_wire_names() {
        assert_eq!(TokenType::Bearer.as_str(), "bearer");
        assert_eq!(TokenType::IdToken.as_str(), "id_token");
        assert_eq!(
            serde_json::to_value(TokenType::IdToken).unwrap(),
            serde_json::json!("id_token")
        );
    }

    #[test]
    fn information_is_additive() {
        let mut token = AccessToken::bearer("abc").with_information("jti", "1");
        token.insert_information("custom", 7);
        assert_eq!(token.additional_information().len(), 2);
        assert_eq!(token.additional_information()["jti"], "1");
    }

    #[test]
    fn context_request_parameters() {
        let ctx = AuthorizationContext::new("client-a")
            .with_parameter("nonce", "n-0S6")
            .with_scope(["openid"]);
        assert_eq!(ctx.nonce(), Some("n-0S6"));
        assert_eq!(ctx.authorization_code(), None);
        assert!(ctx.has_scope("openid"));
        assert!(!ctx.has_scope("profile"));
    }
}
