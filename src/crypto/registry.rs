//! Name-indexed registries for the four algorithm families.
//!
//! Every algorithm is looked up by its case-insensitive name.  An unknown
//! name is a configuration error; there is no fallback to a default.

use std::sync::{Arc, OnceLock};

use crate::errors::{Result, SecureLookupError};

use super::compression::{self, Compression};
use super::encryption::{self, Cipher};
use super::integrity::{self, IntegrityHash};
use super::password_hash::{self, PasswordHash};

/// Implemented by every algorithm in every family.
pub trait Algorithm: Send + Sync {
    /// The canonical name stored in the envelope.
    fn name(&self) -> &str;
}

/// A list of named implementations of one family.
pub struct Registry<T: ?Sized> {
    family: &'static str,
    entries: Vec<Box<T>>,
}

impl<T: Algorithm + ?Sized> Registry<T> {
    pub fn new(family: &'static str) -> Self {
        Self {
            family,
            entries: Vec::new(),
        }
    }

    /// Add an implementation.  Names must be unique ignoring case.
    pub fn register(&mut self, algorithm: Box<T>) -> Result<()> {
        if self.contains(algorithm.name()) {
            return Err(SecureLookupError::DuplicateAlgorithm {
                family: self.family,
                name: algorithm.name().to_string(),
            });
        }
        self.entries.push(algorithm);
        Ok(())
    }

    /// Find an implementation by case-insensitive name.
    pub fn lookup(&self, name: &str) -> Result<&T> {
        self.entries
            .iter()
            .find(|a| a.name().eq_ignore_ascii_case(name))
            .map(|a| &**a)
            .ok_or_else(|| SecureLookupError::UnknownAlgorithm {
                family: self.family,
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|a| a.name().eq_ignore_ascii_case(name))
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|a| a.name()).collect()
    }

    pub fn family(&self) -> &'static str {
        self.family
    }
}

/// The four registries the persistence pipeline draws from.
pub struct Algorithms {
    pub password_hashes: Registry<dyn PasswordHash>,
    pub ciphers: Registry<dyn Cipher>,
    pub compressions: Registry<dyn Compression>,
    pub integrity_hashes: Registry<dyn IntegrityHash>,
}

impl Algorithms {
    /// Empty registries, for callers assembling their own set.
    pub fn empty() -> Self {
        Self {
            password_hashes: Registry::new("password hashing"),
            ciphers: Registry::new("encryption"),
            compressions: Registry::new("compression"),
            integrity_hashes: Registry::new("hash"),
        }
    }

    /// Every algorithm shipped with the crate.
    pub fn builtin() -> Self {
        let mut algorithms = Self::empty();

        // Built-in names are distinct, so registration cannot fail here.
        for alg in password_hash::builtin() {
            let _ = algorithms.password_hashes.register(alg);
        }
        for alg in encryption::builtin() {
            let _ = algorithms.ciphers.register(alg);
        }
        for alg in compression::builtin() {
            let _ = algorithms.compressions.register(alg);
        }
        for alg in integrity::builtin() {
            let _ = algorithms.integrity_hashes.register(alg);
        }

        algorithms
    }

    /// Process-wide built-in registries, constructed on first use.
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<Algorithms>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(Self::builtin())).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy(&'static str);

    impl Algorithm for Dummy {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn lookup_ignores_case() {
        let mut registry: Registry<Dummy> = Registry::new("dummy");
        registry.register(Box::new(Dummy("AES-GCM"))).unwrap();
        assert_eq!(registry.lookup("aes-gcm").unwrap().name(), "AES-GCM");
        assert!(registry.contains("Aes-Gcm"));
    }

    #[test]
    fn unknown_name_is_an_error() {
        let registry: Registry<Dummy> = Registry::new("dummy");
        let err = registry.lookup("nope").err().unwrap();
        assert!(matches!(
            err,
            SecureLookupError::UnknownAlgorithm { family: "dummy", .. }
        ));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry: Registry<Dummy> = Registry::new("dummy");
        registry.register(Box::new(Dummy("x"))).unwrap();
        assert!(registry.register(Box::new(Dummy("X"))).is_err());
        assert_eq!(registry.names(), vec!["x"]);
    }
}
