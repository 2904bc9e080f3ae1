use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::MintError;
use crate::model::AuthorizationContext;

/// Opaque serialization of an [`AuthorizationContext`].
///
/// Lets a non-self-contained (opaque) token carry its authorization context
/// without going back to the issuing grant. The blob is base64 over JSON.
pub struct AuthorizationContextCodec;

impl AuthorizationContextCodec {
    pub fn serialize(context: &AuthorizationContext) -> Result<String, MintError> {
        let bytes = serde_json::to_vec(context).map_err(|e| {
            MintError::InvalidAuthorizationContext(format!("failed to serialize: {e}"))
        })?;
        Ok(STANDARD.encode(bytes))
    }

    pub fn deserialize(blob: &str) -> Result<AuthorizationContext, MintError> {
        let bytes = STANDARD
            .decode(blob.trim())
            .map_err(|e| MintError::InvalidAuthorizationContext(format!("not base64: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| MintError::InvalidAuthorizationContext(e.to_string()))
    }
}
