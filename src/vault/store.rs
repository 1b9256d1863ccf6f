//! The open-database handle and the persistence pipeline.
//!
//! `Database` ties the envelope document, the algorithm registries and the
//! in-memory inner store together:
//!
//! - **save**: serialize, compress, derive a key under a fresh secondary
//!   salt, encrypt under a fresh seed, digest, write atomically.
//! - **load**: parse, verify the digest, derive the primary hash and the
//!   key, decrypt, decompress, deserialize.
//! - **change_password**: new primary salt and size, new primary hash,
//!   optional cipher switch, then a full save.
//!
//! All access goes through `&mut self`; there is no internal locking.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::crypto::keys::{
    random_primary_hash_size, MAX_PRIMARY_HASH_SIZE, MIN_PRIMARY_HASH_SIZE,
};
use crate::crypto::{
    derive_primary_hash, derive_symmetric_key, random_bytes, validate_password, Algorithms,
    PasswordHash, PrimaryHash, PropertyBag,
};
use crate::errors::{Result, SecureLookupError, UnlockStage};

use super::format::{
    self, CompressionSection, EncryptionSection, Envelope, HashSection, PasswordHashing,
};
use super::inner::InnerStore;
use super::params::{AlgorithmChoice, CreationParams};

/// An unlocked database.  Create one with `Database::create` or
/// `Database::load`, edit `store_mut()`, then `save()`.
pub struct Database {
    /// Path to the database file on disk.
    path: PathBuf,

    /// Registries the envelope's algorithm names are resolved against.
    algorithms: Arc<Algorithms>,

    /// The envelope as last written to (or read from) disk.
    envelope: Envelope,

    /// Decrypted contents.
    store: InnerStore,

    /// Output of the primary stage (zeroized on drop).
    primary_hash: PrimaryHash,

    /// Set when `store` has changes that are not on disk yet.
    dirty: bool,

    /// Copy the previous file to `<name>.bak` before replacing it.
    backup_on_save: bool,
}

impl Database {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a new, empty database at `path` with the built-in algorithms.
    pub fn create(path: &Path, password: &str, params: &CreationParams) -> Result<Self> {
        Self::create_with(path, password, params, Algorithms::shared())
    }

    /// Create a new database, resolving algorithm names in `algorithms`.
    pub fn create_with(
        path: &Path,
        password: &str,
        params: &CreationParams,
        algorithms: Arc<Algorithms>,
    ) -> Result<Self> {
        if path.exists() {
            return Err(SecureLookupError::DatabaseAlreadyExists(path.to_path_buf()));
        }

        // 1. Validate everything before doing any expensive work.
        validate_password(password)?;
        if !(MIN_PRIMARY_HASH_SIZE..=MAX_PRIMARY_HASH_SIZE).contains(&params.primary_hash_size) {
            return Err(SecureLookupError::ConfigError(format!(
                "primary hash size must be between {MIN_PRIMARY_HASH_SIZE} and {MAX_PRIMARY_HASH_SIZE} (got {})",
                params.primary_hash_size
            )));
        }

        let primary = algorithms
            .password_hashes
            .lookup(&params.primary_hashing.algorithm)?;
        let primary_props = resolve_hash_properties(primary, &params.primary_hashing)?;

        let secondary = algorithms
            .password_hashes
            .lookup(&params.secondary_hashing.algorithm)?;
        let secondary_props = resolve_hash_properties(secondary, &params.secondary_hashing)?;

        let compression = algorithms
            .compressions
            .lookup(&params.compression.algorithm)?;
        let compression_props = match &params.compression.properties {
            Some(raw) => PropertyBag::parse(raw)?,
            None => {
                let defaults = compression.default_properties().unwrap_or_default();
                tracing::info!(
                    algorithm = compression.name(),
                    properties = %defaults,
                    "using default compression properties"
                );
                defaults
            }
        };
        compression.validate_properties(&compression_props)?;

        let integrity = algorithms.integrity_hashes.lookup(&params.integrity_hash)?;
        let cipher = algorithms.ciphers.lookup(&params.encryption)?;

        // 2. Derive the primary hash under a fresh primary salt.
        let primary_salt = random_bytes(primary.salt_size());
        let primary_hash = derive_primary_hash(
            primary,
            password,
            params.primary_hash_size,
            &primary_salt,
            &primary_props,
        )?;

        // 3. Build the envelope.  Secondary salt, seed, tag, data and digest
        //    are filled in by the first save.
        let envelope = Envelope {
            primary_password_hashing: PasswordHashing {
                algorithm: primary.name().to_string(),
                salt: primary_salt,
                properties: primary_props.to_string(),
            },
            primary_password_hash_size: params.primary_hash_size,
            secondary_password_hashing: PasswordHashing {
                algorithm: secondary.name().to_string(),
                salt: Vec::new(),
                properties: secondary_props.to_string(),
            },
            compression: CompressionSection {
                algorithm: compression.name().to_string(),
                properties: compression_props.to_string(),
            },
            hash: HashSection {
                algorithm: integrity.name().to_string(),
                hash: String::new(),
            },
            encryption: EncryptionSection {
                algorithm: cipher.name().to_string(),
                seed: Vec::new(),
                tag: Vec::new(),
                data: Vec::new(),
            },
        };

        let mut db = Self {
            path: path.to_path_buf(),
            algorithms,
            envelope,
            store: InnerStore::new(),
            primary_hash,
            dirty: true,
            backup_on_save: false,
        };

        // 4. Persist the empty store.
        db.save()?;
        tracing::info!(path = %path.display(), "database created");

        Ok(db)
    }

    /// Open an existing database with the built-in algorithms.
    pub fn load(path: &Path, password: &str) -> Result<Self> {
        Self::load_with(path, password, Algorithms::shared())
    }

    /// Open an existing database, verifying integrity before decrypting.
    pub fn load_with(path: &Path, password: &str, algorithms: Arc<Algorithms>) -> Result<Self> {
        // 1. Read and parse the envelope document.
        let envelope = format::read_envelope(path)?;

        let size = envelope.primary_password_hash_size;
        if !(MIN_PRIMARY_HASH_SIZE..=MAX_PRIMARY_HASH_SIZE).contains(&size) {
            return Err(SecureLookupError::InvalidFormat(format!(
                "primaryPasswordHashSize {size} is outside {MIN_PRIMARY_HASH_SIZE}..={MAX_PRIMARY_HASH_SIZE}"
            )));
        }

        // 2. Resolve every algorithm and its properties.
        let primary = algorithms
            .password_hashes
            .lookup(&envelope.primary_password_hashing.algorithm)?;
        let primary_props = PropertyBag::parse(&envelope.primary_password_hashing.properties)?;
        primary.validate_properties(&primary_props)?;

        let secondary = algorithms
            .password_hashes
            .lookup(&envelope.secondary_password_hashing.algorithm)?;
        let secondary_props = PropertyBag::parse(&envelope.secondary_password_hashing.properties)?;
        secondary.validate_properties(&secondary_props)?;

        let compression = algorithms
            .compressions
            .lookup(&envelope.compression.algorithm)?;
        let compression_props = PropertyBag::parse(&envelope.compression.properties)?;
        compression.validate_properties(&compression_props)?;

        let integrity = algorithms
            .integrity_hashes
            .lookup(&envelope.hash.algorithm)?;
        let cipher = algorithms.ciphers.lookup(&envelope.encryption.algorithm)?;

        // 3. Verify the digest over the ciphertext before any key work.
        integrity.verify(&envelope.encryption.data, &envelope.hash.hash)?;

        // 4. Primary hash, then the symmetric key under the stored salt.
        let primary_hash = derive_primary_hash(
            primary,
            password,
            size,
            &envelope.primary_password_hashing.salt,
            &primary_props,
        )?;
        let key = derive_symmetric_key(
            secondary,
            &primary_hash,
            cipher.key_size(),
            &envelope.secondary_password_hashing.salt,
            &secondary_props,
        )?;

        // 5. Decrypt, decompress, deserialize.
        let packed = Zeroizing::new(cipher.decrypt(
            &envelope.encryption.data,
            &key,
            &envelope.encryption.seed,
            &envelope.encryption.tag,
        )?);
        let plain = Zeroizing::new(compression.decompress(&packed, &compression_props)?);
        let store: InnerStore = serde_json::from_slice(&plain)
            .map_err(|e| SecureLookupError::unlock(UnlockStage::Deserialization, e.to_string()))?;

        tracing::debug!(
            path = %path.display(),
            entries = store.len(),
            "database loaded"
        );

        Ok(Self {
            path: path.to_path_buf(),
            algorithms,
            envelope,
            store,
            primary_hash,
            dirty: false,
            backup_on_save: false,
        })
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Encrypt the inner store and write it to disk atomically.
    ///
    /// The secondary salt and the seed are regenerated on every call.  The
    /// in-memory envelope is only replaced once the file is written.
    pub fn save(&mut self) -> Result<()> {
        let algorithms = Arc::clone(&self.algorithms);
        let env = &self.envelope;

        let secondary = algorithms
            .password_hashes
            .lookup(&env.secondary_password_hashing.algorithm)?;
        let secondary_props = PropertyBag::parse(&env.secondary_password_hashing.properties)?;
        let compression = algorithms.compressions.lookup(&env.compression.algorithm)?;
        let compression_props = PropertyBag::parse(&env.compression.properties)?;
        let integrity = algorithms.integrity_hashes.lookup(&env.hash.algorithm)?;
        let cipher = algorithms.ciphers.lookup(&env.encryption.algorithm)?;

        // 1. Serialize and compress.
        let plain = Zeroizing::new(serde_json::to_vec(&self.store).map_err(|e| {
            SecureLookupError::SerializationError(format!("inner store: {e}"))
        })?);
        let packed = Zeroizing::new(compression.compress(&plain, &compression_props)?);

        // 2. Fresh secondary salt, fresh key.
        let secondary_salt = random_bytes(secondary.salt_size());
        let key = derive_symmetric_key(
            secondary,
            &self.primary_hash,
            cipher.key_size(),
            &secondary_salt,
            &secondary_props,
        )?;

        // 3. Encrypt under a fresh seed and digest the ciphertext.
        let sealed = cipher.encrypt(&packed, &key)?;
        let digest = integrity.digest_hex(&sealed.data);

        tracing::debug!(
            plain = plain.len(),
            compressed = packed.len(),
            encrypted = sealed.data.len(),
            "inner store sealed"
        );

        // 4. Write, then commit the new envelope.
        let mut next = env.clone();
        next.secondary_password_hashing.salt = secondary_salt;
        next.hash.hash = digest;
        next.encryption.seed = sealed.seed;
        next.encryption.tag = sealed.tag;
        next.encryption.data = sealed.data;

        format::write_envelope(&self.path, &next, self.backup_on_save)?;

        self.envelope = next;
        self.dirty = false;
        Ok(())
    }

    /// Re-key the database under `new_password`, optionally switching the
    /// cipher, and save.
    ///
    /// The primary salt and the primary hash size are regenerated.  If the
    /// save fails the handle keeps its previous envelope and primary hash.
    pub fn change_password(&mut self, new_password: &str, new_cipher: Option<&str>) -> Result<()> {
        // 1. Validate inputs first.
        validate_password(new_password)?;
        let algorithms = Arc::clone(&self.algorithms);
        let cipher_name = match new_cipher {
            Some(name) => algorithms.ciphers.lookup(name)?.name().to_string(),
            None => self.envelope.encryption.algorithm.clone(),
        };

        let primary = algorithms
            .password_hashes
            .lookup(&self.envelope.primary_password_hashing.algorithm)?;
        let primary_props = PropertyBag::parse(&self.envelope.primary_password_hashing.properties)?;

        // 2. New primary salt and size, new primary hash.
        let salt = random_bytes(primary.salt_size());
        let size = random_primary_hash_size();
        let primary_hash = derive_primary_hash(primary, new_password, size, &salt, &primary_props)?;

        // 3. Swap in the new state, keeping the old one for rollback.
        let previous_envelope = self.envelope.clone();
        let previous_hash = std::mem::replace(&mut self.primary_hash, primary_hash);
        self.envelope.primary_password_hashing.salt = salt;
        self.envelope.primary_password_hash_size = size;
        self.envelope.encryption.algorithm = cipher_name;

        // 4. Full save under the new key.
        if let Err(e) = self.save() {
            self.envelope = previous_envelope;
            self.primary_hash = previous_hash;
            return Err(e);
        }

        tracing::info!(
            cipher = %self.envelope.encryption.algorithm,
            "database password changed"
        );
        Ok(())
    }

    /// Write the inner store as plain, pretty-printed JSON.  The output is
    /// **not encrypted**.
    pub fn export(&self, destination: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.store)
            .map_err(|e| SecureLookupError::SerializationError(format!("export: {e}")))?;
        fs::write(destination, json)?;
        tracing::warn!(path = %destination.display(), "database exported without encryption");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn store(&self) -> &InnerStore {
        &self.store
    }

    /// Mutable access to the inner store.  Marks the handle dirty.
    pub fn store_mut(&mut self) -> &mut InnerStore {
        self.dirty = true;
        &mut self.store
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_backup_on_save(&mut self, enabled: bool) {
        self.backup_on_save = enabled;
    }

    pub fn algorithms(&self) -> &Algorithms {
        &self.algorithms
    }
}

/// Parse the given hashing properties or fall back to the algorithm's
/// defaults, then validate them.
fn resolve_hash_properties(
    algorithm: &dyn PasswordHash,
    choice: &AlgorithmChoice,
) -> Result<PropertyBag> {
    let props = match &choice.properties {
        Some(raw) => PropertyBag::parse(raw)?,
        None => {
            let defaults = algorithm.default_properties().unwrap_or_default();
            tracing::info!(
                algorithm = algorithm.name(),
                properties = %defaults,
                "using default password hashing properties"
            );
            defaults
        }
    };
    algorithm.validate_properties(&props)?;
    Ok(props)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::entry::Entry;
    use tempfile::TempDir;

    fn fast_params() -> CreationParams {
        CreationParams {
            primary_hashing: AlgorithmChoice::new("PBKDF2-HMAC-SHA256")
                .with_properties("iterations=10"),
            secondary_hashing: AlgorithmChoice::new("PBKDF2-HMAC-SHA256")
                .with_properties("iterations=10"),
            ..CreationParams::default()
        }
    }

    #[test]
    fn create_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lookup.db");

        let mut db = Database::create(&path, "pw", &fast_params()).unwrap();
        assert!(!db.is_dirty());
        db.store_mut().add_entry(Entry::new("bank", "x1", "abc"));
        assert!(db.is_dirty());
        db.save().unwrap();

        let loaded = Database::load(&path, "pw").unwrap();
        assert_eq!(loaded.store(), db.store());
        assert!(!loaded.is_dirty());
    }

    #[test]
    fn create_refuses_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lookup.db");
        fs::write(&path, b"{}").unwrap();
        assert!(matches!(
            Database::create(&path, "pw", &fast_params()),
            Err(SecureLookupError::DatabaseAlreadyExists(_))
        ));
    }

    #[test]
    fn unknown_algorithm_is_a_configuration_error() {
        let dir = TempDir::new().unwrap();
        let params = CreationParams {
            encryption: "ROT13".into(),
            ..fast_params()
        };
        let err = Database::create(&dir.path().join("x.db"), "pw", &params)
            .err()
            .unwrap();
        assert!(matches!(err, SecureLookupError::UnknownAlgorithm { .. }));
        assert!(!dir.path().join("x.db").exists());
    }

    #[test]
    fn failed_password_change_keeps_old_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lookup.db");
        let mut db = Database::create(&path, "pw", &fast_params()).unwrap();
        let before = db.envelope().clone();

        assert!(db.change_password("bad;pw", None).is_err());
        assert!(db.change_password("new", Some("ROT13")).is_err());
        assert_eq!(db.envelope(), &before);
    }

    #[test]
    fn canonical_names_are_stored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lookup.db");
        let params = CreationParams {
            encryption: "chacha20-poly1305".into(),
            integrity_hash: "blake3".into(),
            ..fast_params()
        };
        let db = Database::create(&path, "pw", &params).unwrap();
        assert_eq!(db.envelope().encryption.algorithm, "ChaCha20-Poly1305");
        assert_eq!(db.envelope().hash.algorithm, "BLAKE3");
    }
}
