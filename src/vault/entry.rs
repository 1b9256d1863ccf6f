//! Entry type stored inside the encrypted inner store.
//!
//! An entry maps a human-readable name to an obfuscated archive file and
//! that archive's own password.  The archive password is a separate secret
//! from the database's master password.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bit flags carried by an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryFlags(u32);

impl EntryFlags {
    pub const NONE: Self = Self(0);

    /// The entry was superseded by a newer one with the same name and is
    /// only kept so its archive stays recoverable.
    pub const BACKUP: Self = Self(1);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// One record of the lookup table.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Unique (case-insensitive) among entries without the backup flag.
    pub name: String,

    /// Name of the file or directory before it was archived.
    #[serde(default)]
    pub original_file_name: String,

    /// Obfuscated name of the archive on disk.
    pub archive_file_name: String,

    /// The archive's own password.
    pub password: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "EntryFlags::is_empty")]
    pub flags: EntryFlags,
}

impl Entry {
    pub fn new(
        name: impl Into<String>,
        archive_file_name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            original_file_name: String::new(),
            archive_file_name: archive_file_name.into(),
            password: password.into(),
            urls: None,
            notes: None,
            created: None,
            last_modified: None,
            flags: EntryFlags::NONE,
        }
    }

    pub fn with_original_file_name(mut self, original: impl Into<String>) -> Self {
        self.original_file_name = original.into();
        self
    }

    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.urls = (!urls.is_empty()).then_some(urls);
        self
    }

    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes = (!notes.is_empty()).then_some(notes);
        self
    }

    pub fn is_backup(&self) -> bool {
        self.flags.contains(EntryFlags::BACKUP)
    }

    /// Append one note, creating the list if needed.
    pub fn push_note(&mut self, note: impl Into<String>) {
        self.notes.get_or_insert_with(Vec::new).push(note.into());
    }

    /// Flag this entry as superseded at `at`.
    pub fn mark_backup(&mut self, at: DateTime<Utc>) {
        self.flags.insert(EntryFlags::BACKUP);
        self.push_note(format!(
            "Marked as backup on {} because a newer entry with the same name was added",
            at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        self.last_modified = Some(at);
    }

    pub fn has_name(&self, name: &str) -> bool {
        same_name(&self.name, name)
    }
}

/// Case-insensitive name comparison with full Unicode case folding.
pub(crate) fn same_name(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

// The archive password must not leak through `{:?}`.
impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name)
            .field("original_file_name", &self.original_file_name)
            .field("archive_file_name", &self.archive_file_name)
            .field("password", &"[REDACTED]")
            .field("urls", &self.urls)
            .field("notes", &self.notes)
            .field("created", &self.created)
            .field("last_modified", &self.last_modified)
            .field("flags", &self.flags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_insert_and_remove() {
        let mut flags = EntryFlags::NONE;
        assert!(flags.is_empty());
        flags.insert(EntryFlags::BACKUP);
        assert!(flags.contains(EntryFlags::BACKUP));
        assert_eq!(flags.bits(), 1);
        flags.remove(EntryFlags::BACKUP);
        assert!(flags.is_empty());
    }

    #[test]
    fn mark_backup_appends_note() {
        let mut entry = Entry::new("bank", "x1", "abc").with_notes(vec!["first".into()]);
        entry.mark_backup(Utc::now());
        assert!(entry.is_backup());
        let notes = entry.notes.as_ref().unwrap();
        assert_eq!(notes.len(), 2);
        assert!(notes[1].starts_with("Marked as backup on "));
        assert!(entry.last_modified.is_some());
    }

    #[test]
    fn json_uses_camel_case_and_skips_empty_fields() {
        let entry = Entry::new("bank", "x1", "abc").with_original_file_name("statements");
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"archiveFileName\":\"x1\""));
        assert!(json.contains("\"originalFileName\":\"statements\""));
        assert!(!json.contains("flags"));
        assert!(!json.contains("urls"));

        let back: Entry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn debug_hides_password() {
        let entry = Entry::new("bank", "x1", "hunter2");
        let shown = format!("{entry:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("REDACTED"));
    }
}
