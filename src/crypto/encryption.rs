//! Symmetric encryption family.
//!
//! A cipher turns plaintext into three separately stored pieces:
//!   data  the ciphertext
//!   seed  the nonce / IV, freshly random on every encryption
//!   tag   the authentication tag (empty for unauthenticated modes)
//!
//! Implementations:
//! - AES-256-GCM            key 32, seed 12, tag 16
//! - ChaCha20-Poly1305      key 32, seed 12, tag 16
//! - XChaCha20-Poly1305     key 32, seed 24, tag 16
//! - AES-256-CBC (PKCS#7)   key 32, seed 16, no tag

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::Aes256Gcm;
use chacha20poly1305::{ChaCha20Poly1305, XChaCha20Poly1305};

use crate::errors::{Result, SecureLookupError, UnlockStage};

use super::random_bytes;
use super::registry::Algorithm;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Output of one encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub data: Vec<u8>,
    pub seed: Vec<u8>,
    pub tag: Vec<u8>,
}

/// A symmetric cipher with a fixed key, seed and tag size.
pub trait Cipher: Algorithm {
    fn key_size(&self) -> usize;
    fn seed_size(&self) -> usize;
    fn tag_size(&self) -> usize;

    /// Encrypt with a caller-provided seed.  Lengths are already checked.
    fn encrypt_raw(&self, plaintext: &[u8], key: &[u8], seed: &[u8]) -> Result<Sealed>;

    /// Decrypt and authenticate.  Lengths are already checked.
    fn decrypt_raw(&self, data: &[u8], key: &[u8], seed: &[u8], tag: &[u8]) -> Result<Vec<u8>>;

    /// Encrypt `plaintext` under a freshly generated random seed.
    fn encrypt(&self, plaintext: &[u8], key: &[u8]) -> Result<Sealed> {
        let seed = random_bytes(self.seed_size());
        self.encrypt_with_seed(plaintext, key, &seed)
    }

    /// Encrypt under a caller-provided seed.  Key and seed must have the
    /// cipher's sizes.
    fn encrypt_with_seed(&self, plaintext: &[u8], key: &[u8], seed: &[u8]) -> Result<Sealed> {
        if key.len() != self.key_size() {
            return Err(SecureLookupError::EncryptionFailed(format!(
                "{} expects a {}-byte key, got {}",
                self.name(),
                self.key_size(),
                key.len()
            )));
        }
        if seed.len() != self.seed_size() {
            return Err(SecureLookupError::EncryptionFailed(format!(
                "{} expects a {}-byte seed, got {}",
                self.name(),
                self.seed_size(),
                seed.len()
            )));
        }
        self.encrypt_raw(plaintext, key, seed)
    }

    /// Decrypt a [`Sealed`] triple.  Any mismatch in seed or tag length is
    /// reported the same way as a failed authentication.
    fn decrypt(&self, data: &[u8], key: &[u8], seed: &[u8], tag: &[u8]) -> Result<Vec<u8>> {
        if key.len() != self.key_size() {
            return Err(SecureLookupError::unlock(
                UnlockStage::Decryption,
                format!("{}: key length {}", self.name(), key.len()),
            ));
        }
        if seed.len() != self.seed_size() || tag.len() != self.tag_size() {
            return Err(SecureLookupError::unlock(
                UnlockStage::Decryption,
                format!(
                    "{}: seed length {} / tag length {} (expected {} / {})",
                    self.name(),
                    seed.len(),
                    tag.len(),
                    self.seed_size(),
                    self.tag_size()
                ),
            ));
        }
        self.decrypt_raw(data, key, seed, tag)
    }
}

/// All built-in ciphers.
pub fn builtin() -> Vec<Box<dyn Cipher>> {
    vec![
        Box::new(AeadCipher::<Aes256Gcm>::new("AES-GCM", 12)),
        Box::new(AeadCipher::<ChaCha20Poly1305>::new("ChaCha20-Poly1305", 12)),
        Box::new(AeadCipher::<XChaCha20Poly1305>::new("XChaCha20-Poly1305", 24)),
        Box::new(AesCbc),
    ]
}

// ---------------------------------------------------------------------------
// AEAD ciphers
// ---------------------------------------------------------------------------

/// Any RustCrypto AEAD with a 32-byte key and 16-byte detached tag.
pub struct AeadCipher<A> {
    name: &'static str,
    seed_size: usize,
    _aead: std::marker::PhantomData<fn() -> A>,
}

impl<A> AeadCipher<A> {
    pub fn new(name: &'static str, seed_size: usize) -> Self {
        Self {
            name,
            seed_size,
            _aead: std::marker::PhantomData,
        }
    }
}

impl<A> Algorithm for AeadCipher<A> {
    fn name(&self) -> &str {
        self.name
    }
}

impl<A: AeadInPlace + KeyInit> Cipher for AeadCipher<A> {
    fn key_size(&self) -> usize {
        32
    }

    fn seed_size(&self) -> usize {
        self.seed_size
    }

    fn tag_size(&self) -> usize {
        16
    }

    fn encrypt_raw(&self, plaintext: &[u8], key: &[u8], seed: &[u8]) -> Result<Sealed> {
        let cipher = A::new_from_slice(key).map_err(|e| {
            SecureLookupError::EncryptionFailed(format!("{}: invalid key length: {e}", self.name))
        })?;

        let mut data = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(aes_gcm::aead::Nonce::<A>::from_slice(seed), b"", &mut data)
            .map_err(|e| {
                SecureLookupError::EncryptionFailed(format!("{}: encryption error: {e}", self.name))
            })?;

        Ok(Sealed {
            data,
            seed: seed.to_vec(),
            tag: tag.to_vec(),
        })
    }

    fn decrypt_raw(&self, data: &[u8], key: &[u8], seed: &[u8], tag: &[u8]) -> Result<Vec<u8>> {
        let cipher = A::new_from_slice(key).map_err(|_| {
            SecureLookupError::unlock(UnlockStage::Decryption, format!("{}: bad key", self.name))
        })?;

        let mut plaintext = data.to_vec();
        cipher
            .decrypt_in_place_detached(
                aes_gcm::aead::Nonce::<A>::from_slice(seed),
                b"",
                &mut plaintext,
                aes_gcm::aead::Tag::<A>::from_slice(tag),
            )
            .map_err(|_| {
                SecureLookupError::unlock(
                    UnlockStage::Decryption,
                    format!("{}: authentication tag mismatch", self.name),
                )
            })?;

        Ok(plaintext)
    }
}

// ---------------------------------------------------------------------------
// AES-CBC
// ---------------------------------------------------------------------------

/// AES-256 in CBC mode with PKCS#7 padding.  Unauthenticated; the envelope
/// digest is the only tamper check.
pub struct AesCbc;

impl Algorithm for AesCbc {
    fn name(&self) -> &str {
        "AES-CBC"
    }
}

impl Cipher for AesCbc {
    fn key_size(&self) -> usize {
        32
    }

    fn seed_size(&self) -> usize {
        16
    }

    fn tag_size(&self) -> usize {
        0
    }

    fn encrypt_raw(&self, plaintext: &[u8], key: &[u8], seed: &[u8]) -> Result<Sealed> {
        let cipher = Aes256CbcEnc::new_from_slices(key, seed).map_err(|e| {
            SecureLookupError::EncryptionFailed(format!("AES-CBC: invalid key or IV: {e}"))
        })?;

        Ok(Sealed {
            data: cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            seed: seed.to_vec(),
            tag: Vec::new(),
        })
    }

    fn decrypt_raw(&self, data: &[u8], key: &[u8], seed: &[u8], _tag: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes256CbcDec::new_from_slices(key, seed).map_err(|_| {
            SecureLookupError::unlock(UnlockStage::Decryption, "AES-CBC: bad key or IV")
        })?;

        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(data)
            .map_err(|_| SecureLookupError::unlock(UnlockStage::Decryption, "AES-CBC: bad padding"))
    }
}
