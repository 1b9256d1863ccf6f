//! Password hashing family.
//!
//! Every implementation stretches `password` into exactly `length` bytes
//! using a salt and a property bag.  The primary stage hashes the user's
//! password; the secondary stage re-hashes the primary output into the
//! cipher key.  Implementations:
//! - Argon2i / Argon2d / Argon2id (memory-hard)
//! - PBKDF2-HMAC over SHA-1, SHA-256, SHA-512, SHA3-256 and SHA3-512
//! - scrypt
//! - bcrypt-pbkdf

use argon2::{Argon2, Params, Version};
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha512};
use zeroize::Zeroizing;

use crate::errors::{Result, SecureLookupError};

use super::properties::PropertyBag;
use super::registry::Algorithm;

/// A salted, tunable password hash producing output of any length.
pub trait PasswordHash: Algorithm {
    /// Length of the random salt generated for this algorithm.
    fn salt_size(&self) -> usize;

    /// Properties used when a new envelope does not specify any.
    fn default_properties(&self) -> Option<PropertyBag> {
        None
    }

    /// Check that `props` parse into this algorithm's parameters.
    fn validate_properties(&self, props: &PropertyBag) -> Result<()>;

    fn is_properties_valid(&self, props: &PropertyBag) -> bool {
        self.validate_properties(props).is_ok()
    }

    /// Hash `password` into exactly `length` bytes.
    fn hash(
        &self,
        password: &[u8],
        length: usize,
        salt: &[u8],
        props: &PropertyBag,
    ) -> Result<Zeroizing<Vec<u8>>>;
}

/// All built-in password hashes.
pub fn builtin() -> Vec<Box<dyn PasswordHash>> {
    vec![
        Box::new(Pbkdf2Hash::new(Pbkdf2Digest::Sha1)),
        Box::new(Pbkdf2Hash::new(Pbkdf2Digest::Sha256)),
        Box::new(Pbkdf2Hash::new(Pbkdf2Digest::Sha512)),
        Box::new(Pbkdf2Hash::new(Pbkdf2Digest::Sha3_256)),
        Box::new(Pbkdf2Hash::new(Pbkdf2Digest::Sha3_512)),
        Box::new(Argon2Hash::new(argon2::Algorithm::Argon2i)),
        Box::new(Argon2Hash::new(argon2::Algorithm::Argon2d)),
        Box::new(Argon2Hash::new(argon2::Algorithm::Argon2id)),
        Box::new(ScryptHash),
        Box::new(BcryptPbkdfHash),
    ]
}

fn kdf_error(algorithm: &str, e: impl std::fmt::Display) -> SecureLookupError {
    SecureLookupError::KeyDerivationFailed(format!("{algorithm}: {e}"))
}

fn invalid(algorithm: &str, reason: impl Into<String>) -> SecureLookupError {
    SecureLookupError::InvalidProperties {
        algorithm: algorithm.to_string(),
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Argon2
// ---------------------------------------------------------------------------

/// Minimum safe memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Typed Argon2 properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Props {
    /// Number of passes over memory (`iterations`).
    pub iterations: u32,
    /// Memory cost in KiB (`memorySizeKb`).
    pub memory_size_kb: u32,
    /// Lanes (`parallelism`).
    pub parallelism: u32,
}

impl Argon2Props {
    pub const ITERATIONS: &'static str = "iterations";
    pub const MEMORY_SIZE: &'static str = "memorySizeKb";
    pub const PARALLELISM: &'static str = "parallelism";

    /// Parse and enforce minimum parameters, so a hand-edited envelope
    /// cannot downgrade the KDF to something trivially weak.
    pub fn from_bag(algorithm: &str, props: &PropertyBag) -> Result<Self> {
        let parsed = Self {
            iterations: props.parse_required(algorithm, Self::ITERATIONS)?,
            memory_size_kb: props.parse_required(algorithm, Self::MEMORY_SIZE)?,
            parallelism: props.parse_required(algorithm, Self::PARALLELISM)?,
        };

        if parsed.memory_size_kb < MIN_MEMORY_KIB {
            return Err(invalid(
                algorithm,
                format!(
                    "{} must be at least {MIN_MEMORY_KIB} (got {})",
                    Self::MEMORY_SIZE,
                    parsed.memory_size_kb
                ),
            ));
        }
        if parsed.iterations < 1 {
            return Err(invalid(algorithm, "iterations must be at least 1"));
        }
        if parsed.parallelism < 1 {
            return Err(invalid(algorithm, "parallelism must be at least 1"));
        }

        Ok(parsed)
    }
}

impl Default for Argon2Props {
    fn default() -> Self {
        Self {
            iterations: 3,
            memory_size_kb: 65_536,
            parallelism: 4,
        }
    }
}

pub struct Argon2Hash {
    variant: argon2::Algorithm,
    name: &'static str,
}

impl Argon2Hash {
    pub fn new(variant: argon2::Algorithm) -> Self {
        let name = match variant {
            argon2::Algorithm::Argon2d => "Argon2d",
            argon2::Algorithm::Argon2i => "Argon2i",
            argon2::Algorithm::Argon2id => "Argon2id",
        };
        Self { variant, name }
    }
}

impl Algorithm for Argon2Hash {
    fn name(&self) -> &str {
        self.name
    }
}

impl PasswordHash for Argon2Hash {
    fn salt_size(&self) -> usize {
        16
    }

    fn default_properties(&self) -> Option<PropertyBag> {
        let d = Argon2Props::default();
        PropertyBag::from_pairs([
            (Argon2Props::ITERATIONS, d.iterations.to_string()),
            (Argon2Props::MEMORY_SIZE, d.memory_size_kb.to_string()),
            (Argon2Props::PARALLELISM, d.parallelism.to_string()),
        ])
        .ok()
    }

    fn validate_properties(&self, props: &PropertyBag) -> Result<()> {
        Argon2Props::from_bag(self.name, props).map(|_| ())
    }

    fn hash(
        &self,
        password: &[u8],
        length: usize,
        salt: &[u8],
        props: &PropertyBag,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let p = Argon2Props::from_bag(self.name, props)?;

        let params = Params::new(p.memory_size_kb, p.iterations, p.parallelism, Some(length))
            .map_err(|e| kdf_error(self.name, format!("invalid Argon2 params: {e}")))?;
        let argon2 = Argon2::new(self.variant, Version::V0x13, params);

        let mut out = Zeroizing::new(vec![0u8; length]);
        argon2
            .hash_password_into(password, salt, &mut out)
            .map_err(|e| kdf_error(self.name, e))?;

        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// PBKDF2
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pbkdf2Digest {
    Sha1,
    Sha256,
    Sha512,
    Sha3_256,
    Sha3_512,
}

impl Pbkdf2Digest {
    fn algorithm_name(self) -> &'static str {
        match self {
            Self::Sha1 => "PBKDF2-HMAC-SHA1",
            Self::Sha256 => "PBKDF2-HMAC-SHA256",
            Self::Sha512 => "PBKDF2-HMAC-SHA512",
            Self::Sha3_256 => "PBKDF2-HMAC-SHA3-256",
            Self::Sha3_512 => "PBKDF2-HMAC-SHA3-512",
        }
    }

    /// OWASP-style iteration counts for each digest.
    fn default_iterations(self) -> u32 {
        match self {
            Self::Sha1 => 1_300_000,
            Self::Sha256 | Self::Sha3_256 => 600_000,
            Self::Sha512 | Self::Sha3_512 => 210_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pbkdf2Props {
    pub iterations: u32,
}

impl Pbkdf2Props {
    pub const ITERATIONS: &'static str = "iterations";

    pub fn from_bag(algorithm: &str, props: &PropertyBag) -> Result<Self> {
        let iterations: u32 = props.parse_required(algorithm, Self::ITERATIONS)?;
        if iterations < 1 {
            return Err(invalid(algorithm, "iterations must be at least 1"));
        }
        Ok(Self { iterations })
    }
}

pub struct Pbkdf2Hash {
    digest: Pbkdf2Digest,
}

impl Pbkdf2Hash {
    pub fn new(digest: Pbkdf2Digest) -> Self {
        Self { digest }
    }
}

impl Algorithm for Pbkdf2Hash {
    fn name(&self) -> &str {
        self.digest.algorithm_name()
    }
}

impl PasswordHash for Pbkdf2Hash {
    fn salt_size(&self) -> usize {
        32
    }

    fn default_properties(&self) -> Option<PropertyBag> {
        PropertyBag::from_pairs([(
            Pbkdf2Props::ITERATIONS,
            self.digest.default_iterations().to_string(),
        )])
        .ok()
    }

    fn validate_properties(&self, props: &PropertyBag) -> Result<()> {
        Pbkdf2Props::from_bag(self.name(), props).map(|_| ())
    }

    fn hash(
        &self,
        password: &[u8],
        length: usize,
        salt: &[u8],
        props: &PropertyBag,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let rounds = Pbkdf2Props::from_bag(self.name(), props)?.iterations;
        if length == 0 {
            return Err(kdf_error(self.name(), "output length must be positive"));
        }

        let mut out = Zeroizing::new(vec![0u8; length]);
        match self.digest {
            Pbkdf2Digest::Sha1 => pbkdf2_hmac::<sha1::Sha1>(password, salt, rounds, &mut out),
            Pbkdf2Digest::Sha256 => pbkdf2_hmac::<sha2::Sha256>(password, salt, rounds, &mut out),
            Pbkdf2Digest::Sha512 => pbkdf2_hmac::<sha2::Sha512>(password, salt, rounds, &mut out),
            Pbkdf2Digest::Sha3_256 => {
                pbkdf2_hmac::<sha3::Sha3_256>(password, salt, rounds, &mut out)
            }
            Pbkdf2Digest::Sha3_512 => {
                pbkdf2_hmac::<sha3::Sha3_512>(password, salt, rounds, &mut out)
            }
        }

        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// scrypt
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptProps {
    /// log2 of the CPU/memory cost `N`.
    pub log_n: u8,
    /// Block size `r`.
    pub r: u32,
    /// Parallelization `p`.
    pub p: u32,
}

impl ScryptProps {
    pub const LOG_N: &'static str = "logN";
    pub const BLOCK_SIZE: &'static str = "r";
    pub const PARALLELIZATION: &'static str = "p";

    pub fn from_bag(algorithm: &str, props: &PropertyBag) -> Result<Self> {
        let parsed = Self {
            log_n: props.parse_required(algorithm, Self::LOG_N)?,
            r: props.parse_required(algorithm, Self::BLOCK_SIZE)?,
            p: props.parse_required(algorithm, Self::PARALLELIZATION)?,
        };
        if !(1..=24).contains(&parsed.log_n) {
            return Err(invalid(algorithm, "logN must be between 1 and 24"));
        }
        if parsed.r < 1 || parsed.p < 1 {
            return Err(invalid(algorithm, "r and p must be at least 1"));
        }
        Ok(parsed)
    }
}

pub struct ScryptHash;

impl Algorithm for ScryptHash {
    fn name(&self) -> &str {
        "scrypt"
    }
}

impl PasswordHash for ScryptHash {
    fn salt_size(&self) -> usize {
        16
    }

    fn default_properties(&self) -> Option<PropertyBag> {
        PropertyBag::from_pairs([
            (ScryptProps::LOG_N, "17"),
            (ScryptProps::BLOCK_SIZE, "8"),
            (ScryptProps::PARALLELIZATION, "1"),
        ])
        .ok()
    }

    fn validate_properties(&self, props: &PropertyBag) -> Result<()> {
        ScryptProps::from_bag(self.name(), props).map(|_| ())
    }

    fn hash(
        &self,
        password: &[u8],
        length: usize,
        salt: &[u8],
        props: &PropertyBag,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let p = ScryptProps::from_bag(self.name(), props)?;

        // The length given to `Params` only matters for PHC strings; the raw
        // output length comes from the buffer.
        let params = scrypt::Params::new(p.log_n, p.r, p.p, 32)
            .map_err(|e| kdf_error(self.name(), format!("invalid scrypt params: {e}")))?;

        let mut out = Zeroizing::new(vec![0u8; length]);
        scrypt::scrypt(password, salt, &params, &mut out).map_err(|e| kdf_error(self.name(), e))?;
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// bcrypt-pbkdf
// ---------------------------------------------------------------------------

/// Largest output bcrypt-pbkdf can produce.
const BCRYPT_PBKDF_MAX_OUTPUT: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BcryptProps {
    pub rounds: u32,
}

impl BcryptProps {
    pub const ROUNDS: &'static str = "rounds";

    pub fn from_bag(algorithm: &str, props: &PropertyBag) -> Result<Self> {
        let rounds: u32 = props.parse_required(algorithm, Self::ROUNDS)?;
        if rounds < 1 {
            return Err(invalid(algorithm, "rounds must be at least 1"));
        }
        Ok(Self { rounds })
    }
}

pub struct BcryptPbkdfHash;

impl Algorithm for BcryptPbkdfHash {
    fn name(&self) -> &str {
        "bcrypt-pbkdf"
    }
}

impl PasswordHash for BcryptPbkdfHash {
    fn salt_size(&self) -> usize {
        16
    }

    fn default_properties(&self) -> Option<PropertyBag> {
        PropertyBag::from_pairs([(BcryptProps::ROUNDS, "32")]).ok()
    }

    fn validate_properties(&self, props: &PropertyBag) -> Result<()> {
        BcryptProps::from_bag(self.name(), props).map(|_| ())
    }

    fn hash(
        &self,
        password: &[u8],
        length: usize,
        salt: &[u8],
        props: &PropertyBag,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let rounds = BcryptProps::from_bag(self.name(), props)?.rounds;
        if length == 0 || length > BCRYPT_PBKDF_MAX_OUTPUT {
            return Err(kdf_error(
                self.name(),
                format!("output length must be 1..={BCRYPT_PBKDF_MAX_OUTPUT} (got {length})"),
            ));
        }

        // bcrypt-pbkdf refuses empty input, so it always sees the SHA-512
        // of the password instead.
        let prehash = Zeroizing::new(Sha512::digest(password).to_vec());
        let mut out = Zeroizing::new(vec![0u8; length]);
        bcrypt_pbkdf::bcrypt_pbkdf(prehash.as_slice(), salt, rounds, &mut out)
            .map_err(|e| kdf_error(self.name(), format!("{e:?}")))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_argon2() -> PropertyBag {
        PropertyBag::parse("iterations=1;memorySizeKb=8192;parallelism=1").unwrap()
    }

    #[test]
    fn argon2_output_has_requested_length() {
        let h = Argon2Hash::new(argon2::Algorithm::Argon2id);
        let out = h.hash(b"pw", 77, &[7u8; 16], &cheap_argon2()).unwrap();
        assert_eq!(out.len(), 77);
    }

    #[test]
    fn argon2_rejects_weak_memory() {
        let h = Argon2Hash::new(argon2::Algorithm::Argon2id);
        let weak = PropertyBag::parse("iterations=1;memorySizeKb=1024;parallelism=1").unwrap();
        assert!(!h.is_properties_valid(&weak));
        assert!(h.hash(b"pw", 32, &[0u8; 16], &weak).is_err());
    }

    #[test]
    fn argon2_variants_differ() {
        let salt = [3u8; 16];
        let props = cheap_argon2();
        let i = Argon2Hash::new(argon2::Algorithm::Argon2i)
            .hash(b"pw", 32, &salt, &props)
            .unwrap();
        let id = Argon2Hash::new(argon2::Algorithm::Argon2id)
            .hash(b"pw", 32, &salt, &props)
            .unwrap();
        assert_ne!(*i, *id);
    }

    #[test]
    fn pbkdf2_matches_rfc6070_vector() {
        // RFC 6070: P="password", S="salt", c=2, dkLen=20
        let h = Pbkdf2Hash::new(Pbkdf2Digest::Sha1);
        let props = PropertyBag::parse("iterations=2").unwrap();
        let out = h.hash(b"password", 20, b"salt", &props).unwrap();
        assert_eq!(
            hex::encode(&*out),
            "ea6c014dc72d6f8ccd1ed92ace1d41f0d8de8957"
        );
    }

    #[test]
    fn pbkdf2_sha3_is_deterministic() {
        let h = Pbkdf2Hash::new(Pbkdf2Digest::Sha3_512);
        let props = PropertyBag::parse("iterations=10").unwrap();
        let a = h.hash(b"pw", 100, &[1u8; 32], &props).unwrap();
        let b = h.hash(b"pw", 100, &[1u8; 32], &props).unwrap();
        assert_eq!(*a, *b);
        assert_eq!(a.len(), 100);
    }

    #[test]
    fn scrypt_validates_log_n() {
        let bad = PropertyBag::parse("logN=40;r=8;p=1").unwrap();
        assert!(!ScryptHash.is_properties_valid(&bad));
        let ok = PropertyBag::parse("logN=4;r=8;p=1").unwrap();
        let out = ScryptHash.hash(b"pw", 48, &[2u8; 16], &ok).unwrap();
        assert_eq!(out.len(), 48);
    }

    #[test]
    fn bcrypt_pbkdf_accepts_long_binary_passwords() {
        let props = PropertyBag::parse("rounds=2").unwrap();
        let password = [0xA5u8; 128];
        let out = BcryptPbkdfHash
            .hash(&password, 32, &[9u8; 16], &props)
            .unwrap();
        assert_eq!(out.len(), 32);
    }

    #[test]
    fn bcrypt_pbkdf_accepts_empty_password() {
        let props = PropertyBag::parse("rounds=2").unwrap();
        let empty = BcryptPbkdfHash.hash(b"", 48, &[9u8; 16], &props).unwrap();
        let other = BcryptPbkdfHash.hash(b"x", 48, &[9u8; 16], &props).unwrap();
        assert_eq!(empty.len(), 48);
        assert_ne!(*empty, *other);
    }

    #[test]
    fn every_builtin_accepts_empty_password() {
        for alg in builtin() {
            let props = match alg.name() {
                n if n.starts_with("Argon2") => cheap_argon2(),
                n if n.starts_with("PBKDF2") => PropertyBag::parse("iterations=2").unwrap(),
                "scrypt" => PropertyBag::parse("logN=4;r=8;p=1").unwrap(),
                _ => PropertyBag::parse("rounds=2").unwrap(),
            };
            let out = alg.hash(b"", 32, &vec![3u8; alg.salt_size()], &props);
            assert_eq!(out.unwrap().len(), 32, "{}", alg.name());
        }
    }

    #[test]
    fn every_builtin_has_valid_defaults() {
        for alg in builtin() {
            let defaults = alg.default_properties().unwrap_or_default();
            assert!(
                alg.is_properties_valid(&defaults),
                "{} defaults are invalid",
                alg.name()
            );
        }
    }
}
