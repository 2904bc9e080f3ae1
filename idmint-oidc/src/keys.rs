use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use rand::rngs::OsRng;
use rsa::pkcs8::EncodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

use idmint_core::MintError;

/// Key material for signing and verifying tokens.
pub struct SigningKeys {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    kid: String,
}

impl SigningKeys {
    /// Generate a new RSA-2048 key pair for RS256.
    pub fn generate_rsa(kid: &str) -> Result<Self, MintError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048)
            .map_err(|e| MintError::Signing(format!("failed to generate RSA-2048 key: {e}")))?;
        let public_key = RsaPublicKey::from(&private_key);

        // Export private key as PKCS8 PEM for jsonwebtoken EncodingKey.
        let pkcs8_pem = private_key
            .to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
            .map_err(|e| MintError::Signing(format!("failed to export RSA key: {e}")))?;
        let encoding_key = EncodingKey::from_rsa_pem(pkcs8_pem.as_bytes())
            .map_err(|e| MintError::Signing(format!("invalid RSA PEM: {e}")))?;

        let n = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());
        let decoding_key = DecodingKey::from_rsa_components(&n, &e)
            .map_err(|e| MintError::Signing(format!("invalid RSA components: {e}")))?;

        Ok(Self {
            algorithm: Algorithm::RS256,
            encoding_key,
            decoding_key,
            kid: kid.to_string(),
        })
    }

    /// Shared-secret keys for HS256.
    pub fn hmac(secret: &[u8], kid: &str) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            kid: kid.to_string(),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}
