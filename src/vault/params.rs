//! Algorithm choices for a new database.

use crate::crypto::keys::MIN_PRIMARY_HASH_SIZE;

/// An algorithm name with optional property-bag text.  `None` properties
/// mean "use the algorithm's defaults".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmChoice {
    pub algorithm: String,
    pub properties: Option<String>,
}

impl AlgorithmChoice {
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            properties: None,
        }
    }

    pub fn with_properties(mut self, properties: impl Into<String>) -> Self {
        self.properties = Some(properties.into());
        self
    }
}

/// Everything `Database::create` needs besides the path and password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationParams {
    pub primary_hashing: AlgorithmChoice,
    /// Initial primary hash size in bytes (32..=128).
    pub primary_hash_size: usize,
    pub secondary_hashing: AlgorithmChoice,
    pub compression: AlgorithmChoice,
    pub integrity_hash: String,
    pub encryption: String,
}

impl Default for CreationParams {
    fn default() -> Self {
        Self {
            primary_hashing: AlgorithmChoice::new("Argon2id"),
            primary_hash_size: MIN_PRIMARY_HASH_SIZE,
            secondary_hashing: AlgorithmChoice::new("PBKDF2-HMAC-SHA512"),
            compression: AlgorithmChoice::new("Deflate"),
            integrity_hash: "SHA3-512".to_string(),
            encryption: "AES-GCM".to_string(),
        }
    }
}
