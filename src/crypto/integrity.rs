//! Unkeyed integrity digests over the ciphertext.
//!
//! The digest is checked before any key derivation or decryption so that
//! a damaged file is rejected cheaply.  It is stored as upper-case hex and
//! compared in constant time.

use sha2::{Digest, Sha256, Sha512};
use sha3::{Sha3_256, Sha3_512};
use subtle::ConstantTimeEq;

use crate::errors::{Result, SecureLookupError, UnlockStage};

use super::registry::Algorithm;

pub trait IntegrityHash: Algorithm {
    /// Digest length in bytes.
    fn output_size(&self) -> usize;

    fn digest(&self, data: &[u8]) -> Vec<u8>;

    /// Digest encoded as upper-case hex.
    fn digest_hex(&self, data: &[u8]) -> String {
        hex::encode_upper(self.digest(data))
    }

    /// Check `data` against a stored hex digest (case-insensitive).
    fn verify(&self, data: &[u8], expected_hex: &str) -> Result<()> {
        let expected = hex::decode(expected_hex.trim()).map_err(|e| {
            SecureLookupError::unlock(
                UnlockStage::Integrity,
                format!("{}: stored digest is not hex: {e}", self.name()),
            )
        })?;
        let actual = self.digest(data);

        if expected.len() != actual.len()
            || !bool::from(expected.as_slice().ct_eq(actual.as_slice()))
        {
            return Err(SecureLookupError::unlock(
                UnlockStage::Integrity,
                format!(
                    "{}: expected={} calculated={}",
                    self.name(),
                    expected_hex.trim().to_ascii_uppercase(),
                    hex::encode_upper(&actual)
                ),
            ));
        }
        Ok(())
    }
}

pub fn builtin() -> Vec<Box<dyn IntegrityHash>> {
    vec![
        Box::new(DigestHash::<Sha256>::new("SHA2-256")),
        Box::new(DigestHash::<Sha512>::new("SHA2-512")),
        Box::new(DigestHash::<Sha3_256>::new("SHA3-256")),
        Box::new(DigestHash::<Sha3_512>::new("SHA3-512")),
        Box::new(Blake3Hash),
    ]
}

/// Any RustCrypto fixed-output digest.
pub struct DigestHash<D> {
    name: &'static str,
    _digest: std::marker::PhantomData<fn() -> D>,
}

impl<D> DigestHash<D> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            _digest: std::marker::PhantomData,
        }
    }
}

impl<D> Algorithm for DigestHash<D> {
    fn name(&self) -> &str {
        self.name
    }
}

impl<D: Digest> IntegrityHash for DigestHash<D> {
    fn output_size(&self) -> usize {
        <D as Digest>::output_size()
    }

    fn digest(&self, data: &[u8]) -> Vec<u8> {
        D::digest(data).to_vec()
    }
}

pub struct Blake3Hash;

impl Algorithm for Blake3Hash {
    fn name(&self) -> &str {
        "BLAKE3"
    }
}

impl IntegrityHash for Blake3Hash {
    fn output_size(&self) -> usize {
        blake3::OUT_LEN
    }

    fn digest(&self, data: &[u8]) -> Vec<u8> {
        blake3::hash(data).as_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_abc() {
        let h = DigestHash::<Sha256>::new("SHA2-256");
        assert_eq!(
            h.digest_hex(b"abc"),
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
        );
    }

    #[test]
    fn verify_accepts_lower_case_hex() {
        for h in builtin() {
            let hex = h.digest_hex(b"payload").to_ascii_lowercase();
            assert!(h.verify(b"payload", &hex).is_ok(), "{}", h.name());
            assert_eq!(h.digest(b"payload").len(), h.output_size());
        }
    }

    #[test]
    fn verify_rejects_flipped_bit() {
        let h = Blake3Hash;
        let hex = h.digest_hex(b"payload");
        let err = h.verify(b"paylobd", &hex).unwrap_err();
        assert_eq!(err.unlock_stage(), Some(UnlockStage::Integrity));
    }

    #[test]
    fn verify_rejects_non_hex_digest() {
        let err = Blake3Hash.verify(b"payload", "zz").unwrap_err();
        assert_eq!(err.unlock_stage(), Some(UnlockStage::Integrity));
    }
}
