use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::keys::MIN_PRIMARY_HASH_SIZE;
use crate::errors::{Result, SecureLookupError};
use crate::vault::{AlgorithmChoice, CreationParams, NameDictionary};

/// Project-level configuration, loaded from `.securelookup.toml`.
///
/// Every field has a sensible default so SecureLookup works out-of-the-box
/// without any config file at all.  Algorithm settings only affect newly
/// created databases; an existing file always uses the algorithms recorded
/// in its envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Database file (relative to the project root) used when `--db` is
    /// not given.
    #[serde(default = "default_database")]
    pub database: String,

    /// Primary password hashing algorithm.
    #[serde(default = "default_primary_hashing")]
    pub primary_hashing: String,

    /// Property bag for the primary algorithm (`k=v;k=v`); algorithm
    /// defaults when absent.
    #[serde(default)]
    pub primary_hashing_properties: Option<String>,

    /// Initial primary hash size in bytes (32..=128).
    #[serde(default = "default_primary_hash_size")]
    pub primary_hash_size: usize,

    #[serde(default = "default_secondary_hashing")]
    pub secondary_hashing: String,

    #[serde(default)]
    pub secondary_hashing_properties: Option<String>,

    #[serde(default = "default_compression")]
    pub compression: String,

    #[serde(default)]
    pub compression_properties: Option<String>,

    #[serde(default = "default_integrity_hash")]
    pub integrity_hash: String,

    #[serde(default = "default_encryption")]
    pub encryption: String,

    /// Length of generated archive names.
    #[serde(default = "default_name_length")]
    pub name_length: usize,

    /// Dictionary for generated archive names: a named set such as
    /// `AlphaNumeric`, or a literal character pool.
    #[serde(default = "default_name_dictionary")]
    pub name_dictionary: String,

    /// Copy the previous database file to `<name>.bak` on every save.
    #[serde(default = "default_backup_on_save")]
    pub backup_on_save: bool,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_database() -> String {
    "securelookup.db".to_string()
}

fn default_primary_hashing() -> String {
    "Argon2id".to_string()
}

fn default_primary_hash_size() -> usize {
    MIN_PRIMARY_HASH_SIZE
}

fn default_secondary_hashing() -> String {
    "PBKDF2-HMAC-SHA512".to_string()
}

fn default_compression() -> String {
    "Deflate".to_string()
}

fn default_integrity_hash() -> String {
    "SHA3-512".to_string()
}

fn default_encryption() -> String {
    "AES-GCM".to_string()
}

fn default_name_length() -> usize {
    16
}

fn default_name_dictionary() -> String {
    "AlphaNumeric".to_string()
}

fn default_backup_on_save() -> bool {
    true
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: default_database(),
            primary_hashing: default_primary_hashing(),
            primary_hashing_properties: None,
            primary_hash_size: default_primary_hash_size(),
            secondary_hashing: default_secondary_hashing(),
            secondary_hashing_properties: None,
            compression: default_compression(),
            compression_properties: None,
            integrity_hash: default_integrity_hash(),
            encryption: default_encryption(),
            name_length: default_name_length(),
            name_dictionary: default_name_dictionary(),
            backup_on_save: default_backup_on_save(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = ".securelookup.toml";

    /// Load settings from `<project_dir>/.securelookup.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            SecureLookupError::ConfigError(format!(
                "Failed to parse {}: {e}",
                config_path.display()
            ))
        })?;

        tracing::debug!(path = %config_path.display(), "settings loaded");
        Ok(settings)
    }

    /// Full path to the default database file.
    pub fn database_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.database)
    }

    /// Convert the algorithm settings into creation parameters.
    pub fn creation_params(&self) -> CreationParams {
        let choice = |algorithm: &str, properties: &Option<String>| AlgorithmChoice {
            algorithm: algorithm.to_string(),
            properties: properties.clone(),
        };

        CreationParams {
            primary_hashing: choice(&self.primary_hashing, &self.primary_hashing_properties),
            primary_hash_size: self.primary_hash_size,
            secondary_hashing: choice(&self.secondary_hashing, &self.secondary_hashing_properties),
            compression: choice(&self.compression, &self.compression_properties),
            integrity_hash: self.integrity_hash.clone(),
            encryption: self.encryption.clone(),
        }
    }

    /// Resolve the configured name dictionary.
    pub fn name_dictionary(&self) -> Result<NameDictionary> {
        NameDictionary::named(&self.name_dictionary)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
