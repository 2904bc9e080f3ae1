//! Digest primitives behind the `at_hash` and `c_hash` claims.
//!
//! OIDC Core §3.1.3.6: hash the ASCII octets of the value with the digest
//! matching the signing algorithm, keep the left-most half, base64url-encode.
//! Hashers carry internal state, so every call builds its own.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::MintError;

pub const SHA_256: &str = "SHA-256";
pub const SHA_384: &str = "SHA-384";
pub const SHA_512: &str = "SHA-512";

/// Digest names this build can compute.
pub const SUPPORTED_DIGESTS: &[&str] = &[SHA_256, SHA_384, SHA_512];

/// Compute the named digest over `bytes`.
pub fn digest(algorithm: &str, bytes: &[u8]) -> Result<Vec<u8>, MintError> {
    let out = match algorithm {
        SHA_256 => Sha256::digest(bytes).to_vec(),
        SHA_384 => Sha384::digest(bytes).to_vec(),
        SHA_512 => Sha512::digest(bytes).to_vec(),
        other => return Err(MintError::UnsupportedAlgorithm(other.to_string())),
    };
    Ok(out)
}

/// Left half of the digest of `input`, base64url without padding.
pub fn truncated_hash(algorithm: &str, input: &str) -> Result<String, MintError> {
    let hashed = digest(algorithm, input.as_bytes())?;
    Ok(URL_SAFE_NO_PAD.encode(&hashed[..hashed.len() / 2]))
}

/// Signing algorithm (JOSE `alg`) to digest name table.
///
/// Algorithms missing from the table are rejected instead of guessed.
/// Keys are matched case-insensitively so that flattened configuration keys
/// (`idmint.digest.rs256`) line up with header values (`RS256`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DigestTable {
    entries: BTreeMap<String, String>,
}

impl DigestTable {
    /// An empty table. Every lookup fails until entries are added.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Map `signing_alg` to `digest_name`, replacing any previous entry.
    pub fn with(mut self, signing_alg: impl Into<String>, digest_name: impl Into<String>) -> Self {
        self.insert(signing_alg, digest_name);
        self
    }

    pub fn insert(&mut self, signing_alg: impl Into<String>, digest_name: impl Into<String>) {
        let signing_alg: String = signing_alg.into();
        let digest_name: String = digest_name.into();
        self.entries.insert(
            signing_alg.to_ascii_uppercase(),
            digest_name.to_ascii_uppercase(),
        );
    }

    /// Digest name for the given header algorithm.
    pub fn digest_for(&self, signing_alg: &str) -> Result<&str, MintError> {
        self.entries
            .get(&signing_alg.to_ascii_uppercase())
            .map(String::as_str)
            .ok_or_else(|| MintError::UnsupportedAlgorithm(signing_alg.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for DigestTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for alg in ["HS256", "RS256", "ES256", "PS256"] {
            table.insert(alg, SHA_256);
        }
        for alg in ["HS384", "RS384", "ES384", "PS384"] {
            table.insert(alg, SHA_384);
        }
        for alg in ["HS512", "RS512", "PS512"] {
            table.insert(alg, SHA_512);
        }
        table
    }
}
