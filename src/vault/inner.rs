//! The decrypted contents of a database.
//!
//! `InnerStore` owns the entry list and the set of archive names that were
//! ever handed out.  It only exists in memory; on disk it is the plaintext
//! of the envelope.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SecureLookupError};

use super::entry::{same_name, Entry, EntryFlags};
use super::filter::FilterOptions;
use super::names::NameDictionary;

/// Random candidates tried before giving up on a fresh name.
pub const MAX_NAME_ATTEMPTS: usize = 10_000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InnerStore {
    #[serde(default)]
    entries: Vec<Entry>,

    /// Every archive name issued by `generate_name`, so a name is never
    /// handed out twice even after its entry is dropped.
    #[serde(default)]
    generated_names: BTreeSet<String>,
}

/// What `InnerStore::clean` removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Entries whose archive file no longer exists.
    pub dangling_entries: usize,
    /// Backup entries removed on request.
    pub backup_entries: usize,
    /// Generated names dropped because no file exists for them.
    pub generated_names: usize,
}

impl CleanReport {
    pub fn is_empty(&self) -> bool {
        self.dangling_entries == 0 && self.backup_entries == 0 && self.generated_names == 0
    }
}

impl InnerStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Entries
    // ------------------------------------------------------------------

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Direct access to the entry list.  The caller is responsible for
    /// keeping live names unique.
    pub fn entries_mut(&mut self) -> &mut Vec<Entry> {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add an entry.
    ///
    /// If a live entry with the same name (ignoring case) exists it is not
    /// removed; it is flagged as a backup with a note so its archive stays
    /// recoverable until `clean`.  Returns `true` when that happened.
    pub fn add_entry(&mut self, mut entry: Entry) -> bool {
        let now = Utc::now();

        let mut superseded = false;
        for existing in self
            .entries
            .iter_mut()
            .filter(|e| !e.is_backup() && e.has_name(&entry.name))
        {
            existing.mark_backup(now);
            superseded = true;
        }

        entry.flags.remove(EntryFlags::BACKUP);
        entry.created.get_or_insert(now);
        entry.last_modified.get_or_insert(now);

        tracing::debug!(superseded, "entry added");
        self.entries.push(entry);
        superseded
    }

    /// The live entry with this name.
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|e| !e.is_backup() && e.has_name(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|e| !e.is_backup() && e.has_name(name))
    }

    /// Backup entries that share this name, oldest first.
    pub fn backups_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Entry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.is_backup() && e.has_name(name))
    }

    /// Entries matching `options`, in storage order.
    pub fn filter(&self, options: &FilterOptions) -> Result<Vec<&Entry>> {
        let matcher = options.compile()?;
        Ok(self.entries.iter().filter(|e| matcher.matches(e)).collect())
    }

    /// Remove entries with this name.  Backups are only removed when
    /// `include_backups` is set.  Returns how many were removed.
    pub fn remove(&mut self, name: &str, include_backups: bool) -> Result<usize> {
        let before = self.entries.len();
        self.entries
            .retain(|e| !(e.has_name(name) && (include_backups || !e.is_backup())));
        let removed = before - self.entries.len();

        if removed == 0 {
            return Err(SecureLookupError::EntryNotFound(name.to_string()));
        }
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Drop entries whose archive is missing from `repository`, optionally
    /// drop every backup entry, and forget generated names with no file.
    pub fn clean(&mut self, repository: &Path, remove_backups: bool) -> Result<CleanReport> {
        if !repository.is_dir() {
            return Err(SecureLookupError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!(
                    "archive repository '{}' is not a directory",
                    repository.display()
                ),
            )));
        }

        let mut report = CleanReport::default();

        if remove_backups {
            let before = self.entries.len();
            self.entries.retain(|e| !e.is_backup());
            report.backup_entries = before - self.entries.len();
        }

        let before = self.entries.len();
        self.entries
            .retain(|e| repository.join(&e.archive_file_name).exists());
        report.dangling_entries = before - self.entries.len();

        let before = self.generated_names.len();
        self.generated_names
            .retain(|name| repository.join(name).exists());
        report.generated_names = before - self.generated_names.len();

        tracing::debug!(?report, "inner store cleaned");
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Generated names
    // ------------------------------------------------------------------

    pub fn generated_names(&self) -> &BTreeSet<String> {
        &self.generated_names
    }

    /// Issue a fresh random archive name.
    ///
    /// The name is absent from the generated set, from every entry's
    /// archive name (backups included) and, when `directory` is given,
    /// from that directory.  It is reserved before it is returned.
    pub fn generate_name(
        &mut self,
        directory: Option<&Path>,
        length: usize,
        dictionary: &NameDictionary,
    ) -> Result<String> {
        if length == 0 {
            return Err(SecureLookupError::ConfigError(
                "generated name length must be positive".into(),
            ));
        }

        for _ in 0..MAX_NAME_ATTEMPTS {
            let candidate = dictionary.random_string(length);
            if self.is_name_taken(&candidate, directory) {
                continue;
            }
            self.generated_names.insert(candidate.clone());
            return Ok(candidate);
        }

        Err(SecureLookupError::NameSpaceExhausted(MAX_NAME_ATTEMPTS))
    }

    /// Issue `count` fresh names.  Names already reserved stay reserved
    /// if a later one fails.
    pub fn generate_names(
        &mut self,
        count: usize,
        directory: Option<&Path>,
        length: usize,
        dictionary: &NameDictionary,
    ) -> Result<Vec<String>> {
        (0..count)
            .map(|_| self.generate_name(directory, length, dictionary))
            .collect()
    }

    fn is_name_taken(&self, candidate: &str, directory: Option<&Path>) -> bool {
        self.generated_names
            .iter()
            .any(|n| same_name(n, candidate))
            || self
                .entries
                .iter()
                .any(|e| same_name(&e.archive_file_name, candidate))
            || directory.is_some_and(|dir| dir.join(candidate).exists())
    }
}
