//! Property bags: algorithm parameters stored as `key=value;key=value`.
//!
//! The wire format has no escaping, so `;` may not appear anywhere and `=`
//! may not appear inside a key.  Values are kept as strings here; each
//! algorithm parses the bag into its own typed parameter struct right after
//! lookup (see `PropertyBag::parse_required`).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::{Result, SecureLookupError};

/// Separator between `key=value` pairs.
pub const PAIR_DELIMITER: char = ';';

/// Separator between a key and its value.
pub const KEY_VALUE_DELIMITER: char = '=';

/// A string-keyed map of algorithm parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyBag {
    entries: BTreeMap<String, String>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a bag from its wire form.
    ///
    /// An empty string yields an empty bag and empty segments (for example a
    /// trailing `;`) are skipped.  A segment without `=`, an empty key or a
    /// repeated key is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut entries = BTreeMap::new();

        for segment in raw.split(PAIR_DELIMITER) {
            if segment.is_empty() {
                continue;
            }

            let (key, value) = segment.split_once(KEY_VALUE_DELIMITER).ok_or_else(|| {
                SecureLookupError::InvalidFormat(format!(
                    "property '{segment}' is missing a '{KEY_VALUE_DELIMITER}'"
                ))
            })?;

            if key.is_empty() {
                return Err(SecureLookupError::InvalidFormat(format!(
                    "property '{segment}' has an empty key"
                )));
            }

            if entries.insert(key.to_string(), value.to_string()).is_some() {
                return Err(SecureLookupError::InvalidFormat(format!(
                    "property '{key}' is given more than once"
                )));
            }
        }

        Ok(Self { entries })
    }

    /// Build a bag from pairs, validating that every pair survives a
    /// round trip through the wire format.
    pub fn from_pairs<K, V, I>(pairs: I) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut bag = Self::new();
        for (key, value) in pairs {
            bag.insert(key, value)?;
        }
        Ok(bag)
    }

    /// Insert or replace one property.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        let value = value.into();

        if key.is_empty() {
            return Err(SecureLookupError::InvalidFormat(
                "property keys cannot be empty".into(),
            ));
        }
        if key.contains(PAIR_DELIMITER) || key.contains(KEY_VALUE_DELIMITER) {
            return Err(SecureLookupError::InvalidFormat(format!(
                "property key '{key}' contains a reserved character"
            )));
        }
        if value.contains(PAIR_DELIMITER) {
            return Err(SecureLookupError::InvalidFormat(format!(
                "value of property '{key}' contains '{PAIR_DELIMITER}'"
            )));
        }

        self.entries.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Look up `key` and parse it as `T`, reporting failures against
    /// `algorithm` as invalid properties.
    pub fn parse_required<T>(&self, algorithm: &str, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self
            .get(key)
            .ok_or_else(|| SecureLookupError::InvalidProperties {
                algorithm: algorithm.to_string(),
                reason: format!("missing property '{key}'"),
            })?;

        raw.trim()
            .parse()
            .map_err(|e| SecureLookupError::InvalidProperties {
                algorithm: algorithm.to_string(),
                reason: format!("property '{key}'='{raw}' is not valid: {e}"),
            })
    }
}

impl fmt::Display for PropertyBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, "{PAIR_DELIMITER}")?;
            }
            write!(f, "{key}{KEY_VALUE_DELIMITER}{value}")?;
        }
        Ok(())
    }
}

impl FromStr for PropertyBag {
    type Err = SecureLookupError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_and_serializes_sorted() {
        let bag = PropertyBag::parse("parallelism=4;iterations=3;memorySizeKb=65536").unwrap();
        assert_eq!(bag.len(), 3);
        assert_eq!(bag.get("iterations"), Some("3"));
        assert_eq!(
            bag.to_string(),
            "iterations=3;memorySizeKb=65536;parallelism=4"
        );
    }

    #[test]
    fn empty_string_is_empty_bag() {
        let bag = PropertyBag::parse("").unwrap();
        assert!(bag.is_empty());
        assert_eq!(bag.to_string(), "");
    }

    #[test]
    fn trailing_delimiter_is_ignored() {
        let bag = PropertyBag::parse("x=9;").unwrap();
        assert_eq!(bag.get("x"), Some("9"));
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn value_may_contain_equals() {
        let bag = PropertyBag::parse("k=a=b").unwrap();
        assert_eq!(bag.get("k"), Some("a=b"));
    }

    #[test]
    fn rejects_segment_without_equals() {
        assert!(PropertyBag::parse("iterations").is_err());
    }

    #[test]
    fn rejects_empty_key_and_duplicates() {
        assert!(PropertyBag::parse("=5").is_err());
        assert!(PropertyBag::parse("a=1;a=2").is_err());
    }

    #[test]
    fn insert_rejects_delimiter_in_value() {
        let mut bag = PropertyBag::new();
        assert!(bag.insert("mf", "bt4;x").is_err());
        assert!(bag.insert("a=b", "1").is_err());
        assert!(bag.insert("a", "1").is_ok());
    }

    #[test]
    fn parse_required_reports_missing_and_malformed() {
        let bag = PropertyBag::parse("iterations=abc").unwrap();
        let missing = bag.parse_required::<u32>("Argon2id", "parallelism");
        assert!(matches!(
            missing,
            Err(SecureLookupError::InvalidProperties { .. })
        ));
        assert!(bag.parse_required::<u32>("Argon2id", "iterations").is_err());
    }
}
