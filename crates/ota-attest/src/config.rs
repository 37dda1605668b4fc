//! Engine configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use ota_attest_core::SigningKey;

use crate::error::{EngineError, Result};

/// Configuration for the Engine.
///
/// Every field has a default, so a config file only needs to name what it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding package artifacts.
    pub packages_dir: PathBuf,
    /// SQLite database holding builds and packages.
    pub database_path: PathBuf,
    /// PEM file with the RSA signing key (PKCS#8 or PKCS#1).
    pub private_key_path: PathBuf,
    /// URL path under which packages are downloadable.
    pub package_url_prefix: String,
    /// Verify every fresh signature with the key's public half before
    /// publishing it.
    pub verify_after_sign: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            packages_dir: PathBuf::from("packages"),
            database_path: PathBuf::from("ota.db"),
            private_key_path: PathBuf::from("keys/private.pem"),
            package_url_prefix: "/packages".to_string(),
            verify_after_sign: true,
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Parse a JSON config document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Read the signing key named by `private_key_path`.
    pub fn load_signing_key(&self) -> Result<SigningKey> {
        let pem = std::fs::read_to_string(&self.private_key_path).map_err(|e| {
            EngineError::Config(format!("{}: {}", self.private_key_path.display(), e))
        })?;
        Ok(SigningKey::from_pem(&pem)?)
    }

    /// Download locator for an artifact.
    pub fn package_url(&self, artifact_ref: &str) -> String {
        format!(
            "{}/{}",
            self.package_url_prefix.trim_end_matches('/'),
            artifact_ref.trim_start_matches('/')
        )
    }
}
