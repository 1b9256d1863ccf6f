use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The user-facing text shared by every failure that could be caused by a
/// wrong password.  Which stage actually failed is only logged.
pub const UNLOCK_FAILED_MESSAGE: &str = "wrong password or corrupted database";

/// Pipeline stage at which opening a database failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockStage {
    /// The ciphertext digest did not match the stored one.
    Integrity,
    /// The cipher rejected the key, seed, tag or ciphertext.
    Decryption,
    /// The decrypted bytes were not a valid compressed stream.
    Decompression,
    /// The decompressed bytes were not a valid inner store document.
    Deserialization,
}

impl fmt::Display for UnlockStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Integrity => "integrity check failed",
            Self::Decryption => "decryption failed",
            Self::Decompression => "decompression failed",
            Self::Deserialization => "inner store deserialization failed",
        };
        f.write_str(tag)
    }
}

/// Coarse classification of a [`SecureLookupError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Format,
    Integrity,
    Authentication,
    Crypto,
    Io,
    Entry,
}

/// All errors that can occur in SecureLookup.
#[derive(Debug, Error)]
pub enum SecureLookupError {
    // --- Configuration errors ---
    #[error("Unknown {family} algorithm: {name}")]
    UnknownAlgorithm { family: &'static str, name: String },

    #[error("{family} algorithm '{name}' is already registered")]
    DuplicateAlgorithm { family: &'static str, name: String },

    #[error("Invalid properties for {algorithm}: {reason}")]
    InvalidProperties { algorithm: String, reason: String },

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- Format errors ---
    #[error("Invalid database format: {0}")]
    InvalidFormat(String),

    // --- Opening errors (integrity / authentication) ---
    /// Displays only the generic message; `stage` and `detail` are for logs.
    #[error("Failed to open database — wrong password or corrupted database")]
    Unlock { stage: UnlockStage, detail: String },

    // --- Crypto errors raised while saving ---
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- Database file errors ---
    #[error("Database not found at {0}")]
    DatabaseNotFound(PathBuf),

    #[error("Database already exists at {0}")]
    DatabaseAlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Entry errors ---
    #[error("Entry '{0}' not found")]
    EntryNotFound(String),

    #[error("Could not generate an unused name after {0} attempts — use a longer name or a larger dictionary")]
    NameSpaceExhausted(usize),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl SecureLookupError {
    /// Build an [`SecureLookupError::Unlock`] and log the detail it hides.
    pub fn unlock(stage: UnlockStage, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        tracing::warn!("database unlock failed");
        tracing::debug!(%stage, %detail, "unlock failure detail");
        Self::Unlock { stage, detail }
    }

    /// Which kind of failure this is.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownAlgorithm { .. }
            | Self::DuplicateAlgorithm { .. }
            | Self::InvalidProperties { .. }
            | Self::InvalidPassword(_)
            | Self::ConfigError(_) => ErrorKind::Configuration,
            Self::InvalidFormat(_) => ErrorKind::Format,
            Self::Unlock {
                stage: UnlockStage::Integrity,
                ..
            } => ErrorKind::Integrity,
            Self::Unlock { .. } => ErrorKind::Authentication,
            Self::KeyDerivationFailed(_)
            | Self::EncryptionFailed(_)
            | Self::CompressionFailed(_)
            | Self::SerializationError(_) => ErrorKind::Crypto,
            Self::DatabaseNotFound(_) | Self::DatabaseAlreadyExists(_) | Self::Io(_) => {
                ErrorKind::Io
            }
            Self::EntryNotFound(_)
            | Self::NameSpaceExhausted(_)
            | Self::InvalidFilter(_)
            | Self::CommandFailed(_) => ErrorKind::Entry,
        }
    }

    /// The stage tag of an unlock failure, if this is one.
    pub fn unlock_stage(&self) -> Option<UnlockStage> {
        match self {
            Self::Unlock { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Message suitable for the terminal.
    ///
    /// Integrity and authentication failures collapse into one ambiguous
    /// sentence so the output cannot be used to tell a wrong password apart
    /// from a damaged file.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Integrity | ErrorKind::Authentication => {
                format!("Failed to open database — {UNLOCK_FAILED_MESSAGE}")
            }
            _ => self.to_string(),
        }
    }
}

/// Convenience type alias for SecureLookup results.
pub type Result<T> = std::result::Result<T, SecureLookupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlock_display_hides_stage_and_detail() {
        let err = SecureLookupError::Unlock {
            stage: UnlockStage::Integrity,
            detail: "expected=AA calculated=BB".into(),
        };
        let shown = err.to_string();
        assert!(shown.contains(UNLOCK_FAILED_MESSAGE));
        assert!(!shown.contains("AA"));
        assert!(!shown.contains("integrity"));
    }

    #[test]
    fn integrity_and_decryption_share_user_message() {
        let a = SecureLookupError::Unlock {
            stage: UnlockStage::Integrity,
            detail: "x".into(),
        };
        let b = SecureLookupError::Unlock {
            stage: UnlockStage::Decryption,
            detail: "y".into(),
        };
        assert_eq!(a.user_message(), b.user_message());
        assert_eq!(a.kind(), ErrorKind::Integrity);
        assert_eq!(b.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn configuration_errors_keep_their_detail() {
        let err = SecureLookupError::UnknownAlgorithm {
            family: "encryption",
            name: "ROT13".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.user_message().contains("ROT13"));
    }
}
