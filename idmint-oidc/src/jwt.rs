use std::sync::Arc;

use chrono::{Duration, Utc};
use idmint_core::claims::{names, ClaimsMap};
use idmint_core::{AccessToken, AuthorizationContext, MintConfig, MintError};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, Header, Validation};
use serde_json::Value;
use tracing::{debug, warn};

use crate::converter::{IssuedToken, IssuerClaims, TokenClaimsConverter};
use crate::id_token::IdentityToken;
use crate::keys::SigningKeys;

/// Signing and decoding capability the minter relies on.
pub trait TokenCodec: Send + Sync {
    /// JOSE `alg` from the token's protected header.
    fn algorithm_of(&self, token: &str) -> Result<String, MintError>;

    /// Claims of a previously signed token.
    fn decode(&self, token: &str) -> Result<ClaimsMap, MintError>;

    /// Compact serialization of a signed identity token.
    fn encode_identity(
        &self,
        token: &IdentityToken,
        context: &AuthorizationContext,
    ) -> Result<String, MintError>;
}

/// [`TokenCodec`] backed by `jsonwebtoken`.
///
/// Claims are shaped by the [`TokenClaimsConverter`] before signing, for both
/// access and identity tokens.
pub struct JwtTokenCodec {
    keys: Arc<SigningKeys>,
    converter: Arc<TokenClaimsConverter>,
}

impl JwtTokenCodec {
    pub fn new(keys: Arc<SigningKeys>, converter: Arc<TokenClaimsConverter>) -> Self {
        Self { keys, converter }
    }

    /// Codec whose converter stamps the configured issuer on access tokens.
    pub fn from_config(keys: Arc<SigningKeys>, config: &MintConfig) -> Self {
        let converter = TokenClaimsConverter::new().with_adjustment(IssuerClaims::new(&config.issuer));
        Self::new(keys, Arc::new(converter))
    }

    pub fn converter(&self) -> &TokenClaimsConverter {
        &self.converter
    }

    pub fn keys(&self) -> &SigningKeys {
        &self.keys
    }

    /// Create and sign a fresh access token for `context`, valid for `ttl`.
    pub fn issue_access_token(
        &self,
        context: &AuthorizationContext,
        ttl: Duration,
    ) -> Result<AccessToken, MintError> {
        let token = AccessToken::bearer(uuid::Uuid::new_v4().to_string())
            .with_expiration(Utc::now() + ttl)
            .with_scope(context.scope.iter().cloned());
        self.sign_access_token(&token, context)
    }

    /// Sign `token` into a self-contained JWT access token.
    ///
    /// The previous value is kept as `jti` unless one is already present.
    pub fn sign_access_token(
        &self,
        token: &AccessToken,
        context: &AuthorizationContext,
    ) -> Result<AccessToken, MintError> {
        let mut token = token.clone();
        if !token.additional_information().contains_key(names::TOKEN_ID) {
            let jti = token.value().to_string();
            token.insert_information(names::TOKEN_ID, jti);
        }
        let claims = self
            .converter
            .to_wire_claims(IssuedToken::Access(&token), context);
        let jws = self.sign(&claims)?;
        debug!(client_id = %context.client_id, "Signed access token");
        Ok(token.with_value(jws))
    }

    fn sign(&self, claims: &ClaimsMap) -> Result<String, MintError> {
        let mut header = Header::new(self.keys.algorithm());
        header.kid = Some(self.keys.kid().to_string());
        encode(&header, claims, self.keys.encoding_key())
            .map_err(|e| MintError::Signing(format!("failed to sign JWT: {e}")))
    }
}

impl TokenCodec for JwtTokenCodec {
    fn algorithm_of(&self, token: &str) -> Result<String, MintError> {
        let header = decode_header(token).map_err(|e| {
            MintError::UnsupportedAlgorithm(format!("no usable algorithm in token header: {e}"))
        })?;
        algorithm_name(header.alg)
    }

    fn decode(&self, token: &str) -> Result<ClaimsMap, MintError> {
        let mut validation = Validation::new(self.keys.algorithm());
        validation.validate_aud = false;
        let data = decode::<ClaimsMap>(token, self.keys.decoding_key(), &validation).map_err(|e| {
            warn!(error = %e, "Failed to decode token");
            MintError::InvalidToken(e.to_string())
        })?;
        Ok(data.claims)
    }

    fn encode_identity(
        &self,
        token: &IdentityToken,
        context: &AuthorizationContext,
    ) -> Result<String, MintError> {
        let claims = self
            .converter
            .to_wire_claims(IssuedToken::Identity(token), context);
        self.sign(&claims)
    }
}

/// JOSE name of a header algorithm (`RS256`, `EdDSA`, ...).
fn algorithm_name(alg: Algorithm) -> Result<String, MintError> {
    match serde_json::to_value(alg) {
        Ok(Value::String(name)) => Ok(name),
        _ => Err(MintError::UnsupportedAlgorithm(format!("{alg:?}"))),
    }
}
