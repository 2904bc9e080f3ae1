use chrono::Utc;
use idmint_core::claims::{instant_claim, names, scopes, string_claim, ClaimsMap, ID_TOKEN_KEY};
use idmint_core::hashing::truncated_hash;
use idmint_core::{AccessToken, AuthorizationContext, DigestTable, MintConfig, MintError};
use serde_json::Value;
use tracing::{debug, warn};

use crate::enhancer::{apply_scope_enhancers, ClaimsEnhancer, StandardClaimsEnhancer};
use crate::id_token::IdentityToken;
use crate::jwt::TokenCodec;
use crate::store::UserStore;

/// Attaches an OpenID Connect identity token to access tokens granted with
/// the `openid` scope.
///
/// Stateless across requests: each call reads its inputs, builds one
/// [`IdentityToken`] and encodes it. The input token is never modified; on
/// success an augmented copy is returned, on error nothing is attached.
///
/// # Example
///
/// ```ignore
/// let minter = IdTokenMinter::new(users, codec).with_config(&config);
/// let token = minter.enhance(&access_token, &context).await?;
/// let id_token = token.additional_information()["id_token"].as_str();
/// ```
pub struct IdTokenMinter<U, C, E = StandardClaimsEnhancer> {
    users: U,
    codec: C,
    enhancer: E,
    digests: DigestTable,
    default_methods: Vec<String>,
}

/// Claims recovered from the access token itself.
struct BaseClaims {
    issuer: String,
    subject: String,
    expires_at: chrono::DateTime<Utc>,
    auth_time: chrono::DateTime<Utc>,
}

/// `at_hash` and optional `c_hash`.
struct Hashes {
    access_token: String,
    authorization_code: Option<String>,
}

impl<U: UserStore, C: TokenCodec> IdTokenMinter<U, C> {
    /// Minter with the standard claims enhancer and default configuration.
    pub fn new(users: U, codec: C) -> Self {
        let config = MintConfig::default();
        Self {
            users,
            codec,
            enhancer: StandardClaimsEnhancer,
            digests: config.digests,
            default_methods: config.authentication_methods,
        }
    }
}

impl<U: UserStore, C: TokenCodec, E: ClaimsEnhancer> IdTokenMinter<U, C, E> {
    /// Use the digest table and default authentication methods from `config`.
    pub fn with_config(mut self, config: &MintConfig) -> Self {
        self.digests = config.digests.clone();
        self.default_methods = config.authentication_methods.clone();
        self
    }

    /// Replace the claims enhancer.
    pub fn with_enhancer<E2: ClaimsEnhancer>(self, enhancer: E2) -> IdTokenMinter<U, C, E2> {
        IdTokenMinter {
            users: self.users,
            codec: self.codec,
            enhancer,
            digests: self.digests,
            default_methods: self.default_methods,
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Return `token` with an encoded identity token under [`ID_TOKEN_KEY`]
    /// when `openid` was granted, or unchanged otherwise.
    pub async fn enhance(
        &self,
        token: &AccessToken,
        context: &AuthorizationContext,
    ) -> Result<AccessToken, MintError> {
        if !context.has_scope(scopes::OPENID) {
            debug!(client_id = %context.client_id, "No openid scope, passing token through");
            return Ok(token.clone());
        }

        let id_token = self.build_identity_token(token, context).await?;
        let encoded = self.codec.encode_identity(&id_token, context)?;

        let mut enhanced = token.clone();
        enhanced.insert_information(ID_TOKEN_KEY, Value::String(encoded));
        debug!(
            client_id = %context.client_id,
            sub = %id_token.subject(),
            "Attached identity token"
        );
        Ok(enhanced)
    }

    /// Assemble the identity token for `token` without encoding it.
    pub async fn build_identity_token(
        &self,
        token: &AccessToken,
        context: &AuthorizationContext,
    ) -> Result<IdentityToken, MintError> {
        let base = self.base_claims(token)?;
        let hashes = self.hashes(token, context)?;

        let user = match self.users.find_by_username(&base.subject).await {
            Some(user) => user,
            None => {
                warn!(sub = %base.subject, "Identity token subject has no user record");
                return Err(MintError::UserNotFound(base.subject));
            }
        };
        let claims = apply_scope_enhancers(&self.enhancer, ClaimsMap::new(), &user, &context.scope);

        IdentityToken::builder()
            .issuer(base.issuer)
            .subject(base.subject)
            .audience([context.client_id.clone()])
            .expires_at(base.expires_at)
            .issued_at(Utc::now())
            .auth_time(base.auth_time)
            .nonce(context.nonce())
            .authorized_party(context.client_id.clone())
            .access_token_hash(hashes.access_token)
            .authorization_code_hash(hashes.authorization_code)
            .authentication_methods(self.authentication_methods(context))
            .claims(claims)
            .build()
    }

    fn base_claims(&self, token: &AccessToken) -> Result<BaseClaims, MintError> {
        let claims = self.codec.decode(token.value())?;
        let required = |claim: &str| {
            MintError::InvalidToken(format!("access token has no '{claim}' claim"))
        };

        let issuer = string_claim(&claims, names::ISSUER).ok_or_else(|| required(names::ISSUER))?;
        let subject = string_claim(&claims, names::SUBJECT).ok_or_else(|| required(names::SUBJECT))?;
        let expires_at =
            instant_claim(&claims, names::EXPIRATION).ok_or_else(|| required(names::EXPIRATION))?;
        let auth_time = instant_claim(&claims, names::ISSUED_AT).unwrap_or_else(Utc::now);

        debug!(iss = %issuer, sub = %subject, "Decoded access token claims");
        Ok(BaseClaims {
            issuer,
            subject,
            expires_at,
            auth_time,
        })
    }

    fn hashes(&self, token: &AccessToken, context: &AuthorizationContext) -> Result<Hashes, MintError> {
        let alg = self.codec.algorithm_of(token.value())?;
        let digest = self.digests.digest_for(&alg)?;
        debug!(%alg, %digest, "Computing token hashes");

        let access_token = truncated_hash(digest, token.value())?;
        let authorization_code = context
            .authorization_code()
            .map(|code| truncated_hash(digest, code))
            .transpose()?;
        Ok(Hashes {
            access_token,
            authorization_code,
        })
    }

    fn authentication_methods(&self, context: &AuthorizationContext) -> Vec<String> {
        if context.authentication_methods.is_empty() {
            self.default_methods.clone()
        } else {
            context.authentication_methods.clone()
        }
    }
}
