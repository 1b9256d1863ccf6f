//! Two-stage key derivation.
//!
//! The primary stage hashes the user's password with the (expensive)
//! primary algorithm into a `PrimaryHash` of `primaryPasswordHashSize`
//! bytes.  The secondary stage hashes that value, under a salt that is
//! renewed on every save, into the cipher key:
//!
//!   PrimaryHash  = primary(password, size, primary salt, props)
//!   SymmetricKey = secondary(PrimaryHash, key size, secondary salt, props)
//!
//! Only the secondary stage runs on save, so re-keying is cheap while the
//! password still goes through the memory-hard KDF.

use rand::Rng;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::errors::{Result, SecureLookupError};

use super::password_hash::PasswordHash;
use super::properties::{PropertyBag, PAIR_DELIMITER};

/// Smallest allowed primary hash size in bytes.
pub const MIN_PRIMARY_HASH_SIZE: usize = 32;

/// Largest allowed primary hash size in bytes.
pub const MAX_PRIMARY_HASH_SIZE: usize = 128;

/// The output of the primary stage.  Lives only on an open handle and is
/// wiped when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrimaryHash {
    bytes: Vec<u8>,
}

impl PrimaryHash {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for PrimaryHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrimaryHash([REDACTED; {}])", self.bytes.len())
    }
}

/// Reject passwords the envelope cannot represent.  Strength is not judged.
pub fn validate_password(password: &str) -> Result<()> {
    if password.contains(PAIR_DELIMITER) {
        return Err(SecureLookupError::InvalidPassword(format!(
            "password cannot contain '{PAIR_DELIMITER}'"
        )));
    }
    Ok(())
}

/// Pick a new primary hash size uniformly from the allowed range.
pub fn random_primary_hash_size() -> usize {
    rand::rng().random_range(MIN_PRIMARY_HASH_SIZE..=MAX_PRIMARY_HASH_SIZE)
}

/// Run the primary stage.
pub fn derive_primary_hash(
    algorithm: &dyn PasswordHash,
    password: &str,
    size: usize,
    salt: &[u8],
    props: &PropertyBag,
) -> Result<PrimaryHash> {
    if !(MIN_PRIMARY_HASH_SIZE..=MAX_PRIMARY_HASH_SIZE).contains(&size) {
        return Err(SecureLookupError::KeyDerivationFailed(format!(
            "primary hash size {size} is outside {MIN_PRIMARY_HASH_SIZE}..={MAX_PRIMARY_HASH_SIZE}"
        )));
    }

    let out = algorithm.hash(password.as_bytes(), size, salt, props)?;
    tracing::debug!(algorithm = algorithm.name(), size, "primary hash derived");

    Ok(PrimaryHash {
        bytes: out.to_vec(),
    })
}

/// Run the secondary stage, producing exactly `key_size` bytes.
pub fn derive_symmetric_key(
    algorithm: &dyn PasswordHash,
    primary: &PrimaryHash,
    key_size: usize,
    salt: &[u8],
    props: &PropertyBag,
) -> Result<Zeroizing<Vec<u8>>> {
    let key = algorithm.hash(primary.as_bytes(), key_size, salt, props)?;
    if key.len() != key_size {
        return Err(SecureLookupError::KeyDerivationFailed(format!(
            "{} produced {} bytes, cipher needs {key_size}",
            algorithm.name(),
            key.len()
        )));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::password_hash::{Pbkdf2Digest, Pbkdf2Hash};

    fn fast() -> (Pbkdf2Hash, PropertyBag) {
        (
            Pbkdf2Hash::new(Pbkdf2Digest::Sha256),
            PropertyBag::parse("iterations=5").unwrap(),
        )
    }

    #[test]
    fn primary_hash_has_requested_size() {
        let (alg, props) = fast();
        let primary = derive_primary_hash(&alg, "pw", 77, &[1u8; 32], &props).unwrap();
        assert_eq!(primary.len(), 77);
    }

    #[test]
    fn primary_hash_size_is_bounded() {
        let (alg, props) = fast();
        assert!(derive_primary_hash(&alg, "pw", 31, &[1u8; 32], &props).is_err());
        assert!(derive_primary_hash(&alg, "pw", 129, &[1u8; 32], &props).is_err());
    }

    #[test]
    fn symmetric_key_depends_on_secondary_salt() {
        let (alg, props) = fast();
        let primary = derive_primary_hash(&alg, "pw", 32, &[1u8; 32], &props).unwrap();
        let a = derive_symmetric_key(&alg, &primary, 32, &[2u8; 32], &props).unwrap();
        let b = derive_symmetric_key(&alg, &primary, 32, &[3u8; 32], &props).unwrap();
        assert_eq!(a.len(), 32);
        assert_ne!(*a, *b);
    }

    #[test]
    fn random_sizes_stay_in_range() {
        for _ in 0..200 {
            let size = random_primary_hash_size();
            assert!((MIN_PRIMARY_HASH_SIZE..=MAX_PRIMARY_HASH_SIZE).contains(&size));
        }
    }

    #[test]
    fn delimiter_in_password_is_rejected() {
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password("").is_ok());
        assert!(validate_password("a;b").is_err());
    }

    #[test]
    fn debug_output_is_redacted() {
        let (alg, props) = fast();
        let primary = derive_primary_hash(&alg, "pw", 32, &[1u8; 32], &props).unwrap();
        assert_eq!(format!("{primary:?}"), "PrimaryHash([REDACTED; 32])");
    }
}
