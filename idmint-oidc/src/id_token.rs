use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use idmint_core::{ClaimsMap, MintError, TokenType};

/// An OpenID Connect identity token, built once per request and then encoded.
#[derive(Clone, Debug, PartialEq)]
pub struct IdentityToken {
    issuer: String,
    subject: String,
    audience: BTreeSet<String>,
    expires_at: DateTime<Utc>,
    issued_at: DateTime<Utc>,
    auth_time: DateTime<Utc>,
    nonce: Option<String>,
    authorized_party: String,
    access_token_hash: Option<String>,
    authorization_code_hash: Option<String>,
    authentication_methods: Vec<String>,
    claims: ClaimsMap,
}

impl IdentityToken {
    pub fn builder() -> IdentityTokenBuilder {
        IdentityTokenBuilder::default()
    }

    pub fn token_type(&self) -> TokenType {
        TokenType::IdToken
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn audience(&self) -> &BTreeSet<String> {
        &self.audience
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn auth_time(&self) -> DateTime<Utc> {
        self.auth_time
    }

    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    pub fn authorized_party(&self) -> &str {
        &self.authorized_party
    }

    pub fn access_token_hash(&self) -> Option<&str> {
        self.access_token_hash.as_deref()
    }

    pub fn authorization_code_hash(&self) -> Option<&str> {
        self.authorization_code_hash.as_deref()
    }

    pub fn authentication_methods(&self) -> &[String] {
        &self.authentication_methods
    }

    /// Additional claims contributed by the claims enhancers.
    pub fn claims(&self) -> &ClaimsMap {
        &self.claims
    }
}

/// Builder for [`IdentityToken`].
#[derive(Debug, Default)]
pub struct IdentityTokenBuilder {
    issuer: Option<String>,
    subject: Option<String>,
    audience: BTreeSet<String>,
    expires_at: Option<DateTime<Utc>>,
    issued_at: Option<DateTime<Utc>>,
    auth_time: Option<DateTime<Utc>>,
    nonce: Option<String>,
    authorized_party: Option<String>,
    access_token_hash: Option<String>,
    authorization_code_hash: Option<String>,
    authentication_methods: Vec<String>,
    claims: ClaimsMap,
}

impl IdentityTokenBuilder {
    #[must_use]
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Replace the audience with exactly the given recipients.
    #[must_use]
    pub fn audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience = audience.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    #[must_use]
    pub fn issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    #[must_use]
    pub fn auth_time(mut self, auth_time: DateTime<Utc>) -> Self {
        self.auth_time = Some(auth_time);
        self
    }

    #[must_use]
    pub fn nonce(mut self, nonce: Option<&str>) -> Self {
        self.nonce = nonce.map(String::from);
        self
    }

    #[must_use]
    pub fn authorized_party(mut self, client_id: impl Into<String>) -> Self {
        self.authorized_party = Some(client_id.into());
        self
    }

    #[must_use]
    pub fn access_token_hash(mut self, at_hash: impl Into<String>) -> Self {
        self.access_token_hash = Some(at_hash.into());
        self
    }

    #[must_use]
    pub fn authorization_code_hash(mut self, c_hash: Option<String>) -> Self {
        self.authorization_code_hash = c_hash;
        self
    }

    #[must_use]
    pub fn authentication_methods(mut self, methods: Vec<String>) -> Self {
        self.authentication_methods = methods;
        self
    }

    #[must_use]
    pub fn claims(mut self, claims: ClaimsMap) -> Self {
        self.claims = claims;
        self
    }

    /// Build the token. `iss`, `sub`, `exp` and `azp` are required;
    /// `iat` defaults to now and `auth_time` to `iat`.
    pub fn build(self) -> Result<IdentityToken, MintError> {
        let missing = |claim: &str| MintError::InvalidToken(format!("identity token missing '{claim}'"));
        let issued_at = self.issued_at.unwrap_or_else(Utc::now);
        Ok(IdentityToken {
            issuer: self.issuer.ok_or_else(|| missing("iss"))?,
            subject: self.subject.ok_or_else(|| missing("sub"))?,
            audience: self.audience,
            expires_at: self.expires_at.ok_or_else(|| missing("exp"))?,
            issued_at,
            auth_time: self.auth_time.unwrap_or(issued_at),
            nonce: self.nonce,
            authorized_party: self.authorized_party.ok_or_else(|| missing("azp"))?,
            access_token_hash: self.access_token_hash,
            authorization_code_hash: self.authorization_code_hash,
            authentication_methods: self.authentication_methods,
            claims: self.claims,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> IdentityTokenBuilder {
        IdentityToken::builder()
            .issuer("https://id.example")
            .subject("alice")
            .audience(["client-a"])
            .expires_at(Utc::now())
            .authorized_party("client-a")
    }

    #[test]
    fn build_defaults_auth_time_to_issued_at() {
        let token = complete().build().unwrap();
        assert_eq!(token.auth_time(), token.issued_at());
        assert_eq!(token.token_type(), TokenType::IdToken);
        assert!(token.nonce().is_none());
        assert!(token.authorization_code_hash().is_none());
    }

    #[test]
    fn build_requires_subject() {
        let err = IdentityToken::builder()
            .issuer("https://id.example")
            .expires_at(Utc::now())
            .authorized_party("client-a")
            .build()
            .unwrap_err();
        assert!(matches!(err, MintError::InvalidToken(ref m) if m.contains("'sub'")));
    }

    #[test]
    fn audience_is_replaced_not_merged() {
        let token = complete().audience(["client-b"]).build().unwrap();
        assert_eq!(token.audience().len(), 1);
        assert!(token.audience().contains("client-b"));
    }
}
