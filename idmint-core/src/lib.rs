//! Core model for idmint.
//!
//! Holds the token and authorization-context types shared by the claims
//! converter and the identity-token minter, the wire claim names, the
//! `at_hash` / `c_hash` digest primitives and the configuration layer.

pub mod claims;
pub mod codec;
pub mod config;
pub mod error;
pub mod hashing;
pub mod logging;
pub mod model;

pub use claims::ClaimsMap;
pub use codec::AuthorizationContextCodec;
pub use config::{ConfigError, MintConfig};
pub use error::MintError;
pub use hashing::DigestTable;
pub use model::{AccessToken, Address, AuthorizationContext, TokenType, User};

pub mod prelude {
    //! Re-exports of the most commonly used core types.
    pub use crate::claims::{names, scopes, ClaimsMap};
    pub use crate::{AccessToken, AuthorizationContext, MintConfig, MintError, TokenType, User};
}
