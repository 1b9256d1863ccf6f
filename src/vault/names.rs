//! Character pools for random archive names.

use std::fs;
use std::path::Path;

use rand::Rng;

use crate::errors::{Result, SecureLookupError};

const LOWER_ALPHA: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER_ALPHA: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NUMERIC: &str = "0123456789";

/// The set of characters a generated name is drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameDictionary {
    pool: Vec<char>,
}

impl NameDictionary {
    /// Resolve a dictionary by name.
    ///
    /// `LowerAlpha`, `UpperAlpha`, `Numeric`, `LowerAlphaNumeric`,
    /// `UpperAlphaNumeric` and `AlphaNumeric` are recognised ignoring case.
    /// Any other string is used as the character pool itself.
    pub fn named(name: &str) -> Result<Self> {
        let pool = match name.to_ascii_lowercase().as_str() {
            "loweralpha" => LOWER_ALPHA.to_string(),
            "upperalpha" => UPPER_ALPHA.to_string(),
            "numeric" => NUMERIC.to_string(),
            "loweralphanumeric" => format!("{LOWER_ALPHA}{NUMERIC}"),
            "upperalphanumeric" => format!("{UPPER_ALPHA}{NUMERIC}"),
            "alphanumeric" => format!("{UPPER_ALPHA}{LOWER_ALPHA}{NUMERIC}"),
            _ => name.to_string(),
        };
        Self::from_chars(pool.chars())
    }

    /// Read a dictionary file: every line (trimmed) contributes its
    /// characters to the pool.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_chars(content.lines().flat_map(|line| line.trim().chars()))
    }

    /// Build from raw characters.  Duplicates are dropped so every distinct
    /// character is equally likely.
    pub fn from_chars(chars: impl IntoIterator<Item = char>) -> Result<Self> {
        let mut pool: Vec<char> = Vec::new();
        for c in chars {
            if !pool.contains(&c) {
                pool.push(c);
            }
        }

        if pool.is_empty() {
            return Err(SecureLookupError::ConfigError(
                "name dictionary is empty".into(),
            ));
        }
        if pool.iter().any(|c| std::path::is_separator(*c) || c.is_control()) {
            return Err(SecureLookupError::ConfigError(
                "name dictionary cannot contain path separators or control characters".into(),
            ));
        }

        Ok(Self { pool })
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// A uniformly random string of `length` characters.
    pub fn random_string(&self, length: usize) -> String {
        let mut rng = rand::rng();
        (0..length)
            .map(|_| self.pool[rng.random_range(0..self.pool.len())])
            .collect()
    }
}

impl Default for NameDictionary {
    fn default() -> Self {
        Self {
            pool: format!("{UPPER_ALPHA}{LOWER_ALPHA}{NUMERIC}").chars().collect(),
        }
    }
}
