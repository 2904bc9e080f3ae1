//! OpenID Connect identity-token minting for idmint.
//!
//! Converts access tokens to and from their wire claims and, for grants that
//! include the `openid` scope, mints a signed identity token carrying the
//! `at_hash` / `c_hash` integrity claims and the scope-gated user claims.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use idmint_oidc::prelude::*;
//!
//! let config = MintConfig::load("dev")?;
//! let keys = Arc::new(SigningKeys::generate_rsa(&config.kid)?);
//! let codec = JwtTokenCodec::from_config(keys, &config);
//!
//! let users = InMemoryUserStore::new().add_user(User::new("alice"));
//! let minter = IdTokenMinter::new(users, codec).with_config(&config);
//!
//! let access = minter.codec().issue_access_token(&context, chrono::Duration::hours(1))?;
//! let access = minter.enhance(&access, &context).await?;
//! ```

pub mod converter;
pub mod enhancer;
pub mod id_token;
pub mod jwt;
pub mod keys;
pub mod minter;
pub mod store;

pub use converter::{ClaimsAdjustment, IssuedToken, IssuerClaims, TokenClaimsConverter};
pub use enhancer::{ClaimsEnhancer, StandardClaimsEnhancer};
pub use id_token::{IdentityToken, IdentityTokenBuilder};
pub use jwt::{JwtTokenCodec, TokenCodec};
pub use keys::SigningKeys;
pub use minter::IdTokenMinter;
pub use store::{InMemoryUserStore, UserStore};

pub mod prelude {
    //! Re-exports of the most commonly used types.
    pub use crate::{
        IdTokenMinter, InMemoryUserStore, JwtTokenCodec, SigningKeys, TokenClaimsConverter,
        UserStore,
    };
    pub use idmint_core::prelude::*;
}
