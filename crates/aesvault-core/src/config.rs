use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{VaultError, VaultResult};

/// Top-level configuration (loaded from aesvault.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub store: StoreConfig,
}

/// Encrypted file store options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Refuse to load files larger than this many bytes (0 = unlimited, default: 64 MiB)
    pub max_file_size: u64,
    /// fsync the file after every save (default: true)
    pub sync_on_save: bool,
    /// Unix permission bits applied when a save creates a new file (default: 0o600)
    pub file_mode: Option<u32>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_file_size: 64 * 1024 * 1024,
            sync_on_save: true,
            file_mode: Some(0o600),
        }
    }
}

impl VaultConfig {
    pub fn from_toml_str(toml_str: &str) -> VaultResult<Self> {
        toml::from_str(toml_str).map_err(|e| VaultError::Config(format!("parsing config: {e}")))
    }

    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> VaultResult<Self> {
        if !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| VaultError::Config(format!("reading config {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }
}
