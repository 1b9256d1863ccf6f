//! Cryptographic primitives for SecureLookup.
//!
//! This module provides:
//! - Property bags for algorithm parameters (`properties`)
//! - The four algorithm families and their registries (`registry`,
//!   `password_hash`, `encryption`, `compression`, `integrity`)
//! - Two-stage key derivation (`keys`)

pub mod compression;
pub mod encryption;
pub mod integrity;
pub mod keys;
pub mod password_hash;
pub mod properties;
pub mod registry;

use rand::RngCore;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{Algorithms, PropertyBag, derive_primary_hash, ...};
pub use compression::Compression;
pub use encryption::{Cipher, Sealed};
pub use integrity::IntegrityHash;
pub use keys::{derive_primary_hash, derive_symmetric_key, validate_password, PrimaryHash};
pub use password_hash::PasswordHash;
pub use properties::PropertyBag;
pub use registry::{Algorithm, Algorithms, Registry};

/// Fill a new buffer of `len` bytes from the thread-local CSPRNG.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    rand::rng().fill_bytes(&mut buf);
    buf
}
