use crate::config::ConfigError;

/// Errors raised while shaping claims or minting an identity token.
///
/// Every variant aborts the current request; nothing is retried here.
#[derive(Debug)]
pub enum MintError {
    /// No digest is known for the signing algorithm, or the token header
    /// carries no usable algorithm.
    UnsupportedAlgorithm(String),
    /// The token subject does not resolve to a known user.
    UserNotFound(String),
    /// An opaque authorization-context blob failed to decode.
    InvalidAuthorizationContext(String),
    /// A token could not be decoded or lacks a required claim.
    InvalidToken(String),
    /// The signing collaborator failed to encode a token.
    Signing(String),
    /// Configuration could not be loaded.
    Config(ConfigError),
}

impl MintError {
    /// OAuth 2.0 error code (RFC 6749 §5.2 / RFC 6750 §3.1) for this failure.
    pub fn error_code(&self) -> &'static str {
        match self {
            MintError::UnsupportedAlgorithm(_) => "server_error",
            MintError::UserNotFound(_) => "invalid_grant",
            MintError::InvalidAuthorizationContext(_) => "invalid_request",
            MintError::InvalidToken(_) => "invalid_token",
            MintError::Signing(_) => "server_error",
            MintError::Config(_) => "server_error",
        }
    }
}

impl std::fmt::Display for MintError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MintError::UnsupportedAlgorithm(alg) => write!(f, "Unsupported algorithm: {alg}"),
            MintError::UserNotFound(sub) => write!(f, "User not found: {sub}"),
            MintError::InvalidAuthorizationContext(msg) => {
                write!(f, "Invalid authorization context: {msg}")
            }
            MintError::InvalidToken(msg) => write!(f, "Invalid token: {msg}"),
            MintError::Signing(msg) => write!(f, "Signing failed: {msg}"),
            MintError::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for MintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MintError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for MintError {
    fn from(err: ConfigError) -> Self {
        MintError::Config(err)
    }
}
