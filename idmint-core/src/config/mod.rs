mod loader;
pub mod value;

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

pub use value::ConfigValue;

use crate::hashing::{DigestTable, SUPPORTED_DIGESTS};

const ENV_PREFIX: &str = "IDMINT_";
const PROFILE_ENV: &str = "IDMINT_PROFILE";
const KEY_ISSUER: &str = "idmint.issuer";
const KEY_KID: &str = "idmint.kid";
const KEY_METHODS: &str = "idmint.methods";
const DIGEST_PREFIX: &str = "idmint.digest.";

/// A single validation error detail.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationDetail {
    pub key: String,
    pub message: String,
}

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading config files.
    Load(String),
    /// Values parsed but are not acceptable.
    Validation(Vec<ConfigValidationDetail>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::Validation(details) => {
                write!(f, "Config validation errors:")?;
                for detail in details {
                    write!(f, "\n  - {}: {}", detail.key, detail.message)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings for claim shaping and identity-token minting.
///
/// Resolution order (lowest to highest priority):
/// 1. `idmint.yaml` (base)
/// 2. `idmint-{profile}.yaml` (profile override)
/// 3. `.env` and `.env.{profile}` (loaded into the process environment)
/// 4. `IDMINT_*` environment variables (`IDMINT_ISSUER` overrides `idmint.issuer`)
///
/// `.env` files never overwrite already-set environment variables.
/// Profile is determined by: `IDMINT_PROFILE` env var > argument.
#[derive(Debug, Clone, PartialEq)]
pub struct MintConfig {
    /// Issuer (`iss`) stamped on access tokens.
    pub issuer: String,
    /// Key ID (`kid`) placed in JWS headers.
    pub kid: String,
    /// Authentication methods (`amr`) used when the context records none.
    pub authentication_methods: Vec<String>,
    /// Signing algorithm to digest table for `at_hash` / `c_hash`.
    pub digests: DigestTable,
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8080".into(),
            kid: "idmint-key-1".into(),
            authentication_methods: vec!["user".into()],
            digests: DigestTable::default(),
        }
    }
}

impl MintConfig {
    /// Load configuration for `profile` from the current working directory.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."), profile)
    }

    /// Load configuration for `profile` from files in `dir`.
    pub fn load_from(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let active_profile =
            std::env::var(PROFILE_ENV).unwrap_or_else(|_| profile.to_string());

        let mut values = HashMap::new();
        loader::load_yaml_file(&dir.join("idmint.yaml"), &mut values)?;
        loader::load_yaml_file(
            &dir.join(format!("idmint-{active_profile}.yaml")),
            &mut values,
        )?;

        let _ = dotenvy::from_path(dir.join(".env"));
        let _ = dotenvy::from_path(dir.join(format!(".env.{active_profile}")));

        loader::overlay_env(ENV_PREFIX, std::env::vars(), &mut values);

        debug!(profile = %active_profile, keys = values.len(), "Loaded idmint configuration");
        Self::from_values(&values)
    }

    /// Build a config from a YAML string, without files or environment.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml_str(yaml, &mut values)?;
        Self::from_values(&values)
    }

    fn from_values(values: &HashMap<String, ConfigValue>) -> Result<Self, ConfigError> {
        let mut config = MintConfig::default();
        let mut problems = Vec::new();

        if let Some(v) = values.get(KEY_ISSUER) {
            config.issuer = v.as_string(KEY_ISSUER)?;
        }
        if let Some(v) = values.get(KEY_KID) {
            config.kid = v.as_string(KEY_KID)?;
        }
        if let Some(v) = values.get(KEY_METHODS) {
            config.authentication_methods = v.as_string_list(KEY_METHODS)?;
        }

        for (key, v) in values {
            let Some(alg) = key.strip_prefix(DIGEST_PREFIX) else {
                continue;
            };
            let digest = match v.as_string(key) {
                Ok(name) => name.to_ascii_uppercase(),
                Err(_) => {
                    problems.push(ConfigValidationDetail {
                        key: key.clone(),
                        message: "expected a digest name".into(),
                    });
                    continue;
                }
            };
            if SUPPORTED_DIGESTS.contains(&digest.as_str()) {
                config.digests.insert(alg, digest);
            } else {
                problems.push(ConfigValidationDetail {
                    key: key.clone(),
                    message: format!("unsupported digest '{digest}'"),
                });
            }
        }

        if config.issuer.trim().is_empty() {
            problems.push(ConfigValidationDetail {
                key: KEY_ISSUER.into(),
                message: "must not be empty".into(),
            });
        }

        if problems.is_empty() {
            Ok(config)
        } else {
            problems.sort_by(|a, b| a.key.cmp(&b.key));
            Err(ConfigError::Validation(problems))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = MintConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, MintConfig::default());
        assert_eq!(config.authentication_methods, vec!["user"]);
    }

    #[test]
    fn yaml_overrides_defaults() {
        let config = MintConfig::from_yaml_str(
            r#"
idmint:
  issuer: https://id.example.com
  kid: key-7
  methods: [pwd, otp]
  digest:
    EdDSA: SHA-512
"#,
        )
        .unwrap();
        assert_eq!(config.issuer, "https://id.example.com");
        assert_eq!(config.kid, "key-7");
        assert_eq!(config.authentication_methods, vec!["pwd", "otp"]);
        assert_eq!(config.digests.digest_for("EdDSA").unwrap(), "SHA-512");
        assert_eq!(config.digests.digest_for("RS256").unwrap(), "SHA-256");
    }

    #[test]
    fn unknown_digest_fails_validation() {
        let err = MintConfig::from_yaml_str("idmint:\n  digest:\n    RS256: MD5\n").unwrap_err();
        match err {
            ConfigError::Validation(details) => {
                assert_eq!(details.len(), 1);
                assert_eq!(details[0].key, "idmint.digest.rs256");
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn every_bad_digest_entry_is_reported() {
        let err = MintConfig::from_yaml_str(
            "idmint:\n  issuer: ''\n  digest:\n    RS256: [SHA-256]\n    ES256: MD5\n",
        )
        .unwrap_err();
        match err {
            ConfigError::Validation(details) => {
                let keys: Vec<&str> = details.iter().map(|d| d.key.as_str()).collect();
                assert_eq!(
                    keys,
                    vec!["idmint.digest.es256", "idmint.digest.rs256", "idmint.issuer"]
                );
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn blank_issuer_fails_validation() {
        let err = MintConfig::from_yaml_str("idmint:\n  issuer: '  '\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn list_where_string_expected_is_a_type_mismatch() {
        let err = MintConfig::from_yaml_str("idmint:\n  issuer: [a, b]\n").unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
    }
}
