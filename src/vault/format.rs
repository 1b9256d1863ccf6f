//! On-disk envelope document and atomic file I/O.
//!
//! A database file is a pretty-printed JSON document:
//!
//! ```text
//! {
//!   "primaryPasswordHashing":   { "algorithm", "salt", "properties" },
//!   "primaryPasswordHashSize":  32..=128,
//!   "secondaryPasswordHashing": { "algorithm", "salt", "properties" },
//!   "compression":              { "algorithm", "properties" },
//!   "hash":                     { "algorithm", "hash" },
//!   "encryption":               { "algorithm", "seed", "tag", "data" }
//! }
//! ```
//!
//! - Salts, seed, tag and data are Z85 text.
//! - `hash.hash` is the upper-case hex digest of the ciphertext.
//! - `properties` are property-bag strings (`k=v;k=v`).
//!
//! Unknown fields are rejected.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SecureLookupError};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Parameters of one password hashing stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordHashing {
    pub algorithm: String,
    #[serde(with = "z85_bytes")]
    pub salt: Vec<u8>,
    #[serde(default)]
    pub properties: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompressionSection {
    pub algorithm: String,
    #[serde(default)]
    pub properties: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HashSection {
    pub algorithm: String,
    /// Upper-case hex digest of `encryption.data`.
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptionSection {
    pub algorithm: String,
    #[serde(with = "z85_bytes")]
    pub seed: Vec<u8>,
    #[serde(with = "z85_bytes", default)]
    pub tag: Vec<u8>,
    #[serde(with = "z85_bytes")]
    pub data: Vec<u8>,
}

/// The outer, unencrypted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Envelope {
    pub primary_password_hashing: PasswordHashing,
    pub primary_password_hash_size: usize,
    pub secondary_password_hashing: PasswordHashing,
    pub compression: CompressionSection,
    pub hash: HashSection,
    pub encryption: EncryptionSection,
}

impl Envelope {
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| SecureLookupError::SerializationError(format!("envelope: {e}")))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| SecureLookupError::InvalidFormat(format!("envelope JSON: {e}")))
    }
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Read and parse an envelope file.
pub fn read_envelope(path: &Path) -> Result<Envelope> {
    if !path.exists() {
        return Err(SecureLookupError::DatabaseNotFound(path.to_path_buf()));
    }

    let data = fs::read(path)?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "envelope read");
    Envelope::from_json(&data)
}

/// Path of the rolling backup kept next to `path`.
pub fn backup_path(path: &Path) -> PathBuf {
    sibling(path, |name| format!("{name}.bak"))
}

fn temp_path(path: &Path) -> PathBuf {
    sibling(path, |name| format!(".{name}.tmp"))
}

fn sibling(path: &Path, rename: impl FnOnce(&str) -> String) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    parent.join(rename(&name))
}

/// Write an envelope file **atomically**.
///
/// 1. Serialize the envelope.
/// 2. Write it to a temp file in the same directory and fsync it.
/// 3. If `keep_backup` is set and a previous file exists, copy it to
///    `<name>.bak`.
/// 4. Rename the temp file over the target path.
///
/// On failure the target is left untouched.
pub fn write_envelope(path: &Path, envelope: &Envelope, keep_backup: bool) -> Result<()> {
    let bytes = envelope.to_json()?;
    let tmp_path = temp_path(path);

    let written = write_synced(&tmp_path, &bytes).and_then(|()| {
        if keep_backup && path.exists() {
            fs::copy(path, backup_path(path))?;
        }
        fs::rename(&tmp_path, path)
    });

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "envelope written");
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

// ---------------------------------------------------------------------------
// Z85 helpers
// ---------------------------------------------------------------------------

/// Encode bytes as Z85.  Lengths that are not a multiple of four use the
/// `z85` crate's padding extension.
pub fn z85_encode(data: &[u8]) -> String {
    if data.is_empty() {
        return String::new();
    }
    z85::encode(data)
}

pub fn z85_decode(text: &str) -> Result<Vec<u8>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    z85::decode(text).map_err(|e| SecureLookupError::InvalidFormat(format!("invalid Z85: {e:?}")))
}

pub(crate) mod z85_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::z85_encode(data))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        super::z85_decode(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Envelope {
        Envelope {
            primary_password_hashing: PasswordHashing {
                algorithm: "Argon2id".into(),
                salt: vec![1; 16],
                properties: "iterations=1;memorySizeKb=8192;parallelism=1".into(),
            },
            primary_password_hash_size: 32,
            secondary_password_hashing: PasswordHashing {
                algorithm: "PBKDF2-HMAC-SHA512".into(),
                salt: vec![2; 32],
                properties: "iterations=10".into(),
            },
            compression: CompressionSection {
                algorithm: "Deflate".into(),
                properties: "x=9".into(),
            },
            hash: HashSection {
                algorithm: "SHA3-512".into(),
                hash: "AB".into(),
            },
            encryption: EncryptionSection {
                algorithm: "AES-CBC".into(),
                seed: vec![3; 16],
                tag: Vec::new(),
                data: vec![4, 5, 6, 7, 8],
            },
        }
    }

    #[test]
    fn json_uses_camel_case_and_z85() {
        let json = String::from_utf8(sample().to_json().unwrap()).unwrap();
        assert!(json.contains("\"primaryPasswordHashing\""));
        assert!(json.contains("\"primaryPasswordHashSize\": 32"));
        assert!(json.contains("\"tag\": \"\""));
        assert_eq!(Envelope::from_json(json.as_bytes()).unwrap(), sample());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut value: serde_json::Value =
            serde_json::from_slice(&sample().to_json().unwrap()).unwrap();
        value["extra"] = serde_json::json!(1);
        let bytes = serde_json::to_vec(&value).unwrap();
        assert!(matches!(
            Envelope::from_json(&bytes),
            Err(SecureLookupError::InvalidFormat(_))
        ));
    }

    #[test]
    fn z85_handles_unaligned_lengths() {
        for len in 0..9 {
            let data: Vec<u8> = (0..len as u8).collect();
            assert_eq!(z85_decode(&z85_encode(&data)).unwrap(), data);
        }
    }

    #[test]
    fn write_keeps_backup_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lookup.db");

        write_envelope(&path, &sample(), true).unwrap();
        assert!(!backup_path(&path).exists());

        let mut next = sample();
        next.primary_password_hash_size = 64;
        write_envelope(&path, &next, true).unwrap();

        assert_eq!(read_envelope(&path).unwrap(), next);
        assert_eq!(read_envelope(&backup_path(&path)).unwrap(), sample());
        assert!(!dir.path().join(".lookup.db.tmp").exists());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = read_envelope(&dir.path().join("nope.db")).unwrap_err();
        assert!(matches!(err, SecureLookupError::DatabaseNotFound(_)));
    }
}
