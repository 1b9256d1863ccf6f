//! Entry search.

use regex::{Regex, RegexBuilder};

use crate::errors::{Result, SecureLookupError};

use super::entry::Entry;

/// How a keyword is compared with a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum MatchMode {
    Equals,
    #[default]
    Contains,
    StartsWith,
    EndsWith,
    Regex,
}

/// Which fields of an entry are searched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FilterTarget {
    #[default]
    All,
    Name,
    OriginalFileName,
    ArchiveFileName,
    Urls,
    Notes,
}

#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub mode: MatchMode,
    pub target: FilterTarget,
    /// An entry matches when any keyword matches any targeted field.  No
    /// keywords matches everything.
    pub keywords: Vec<String>,
    pub case_sensitive: bool,
    /// Also return entries flagged as backups.
    pub include_backups: bool,
}

impl FilterOptions {
    pub fn new(keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn target(mut self, target: FilterTarget) -> Self {
        self.target = target;
        self
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    pub fn include_backups(mut self, yes: bool) -> Self {
        self.include_backups = yes;
        self
    }

    /// Compile the options once for repeated matching.
    pub(crate) fn compile(&self) -> Result<Matcher<'_>> {
        let patterns = match self.mode {
            MatchMode::Regex => self
                .keywords
                .iter()
                .map(|k| {
                    RegexBuilder::new(k)
                        .case_insensitive(!self.case_sensitive)
                        .build()
                        .map_err(|e| SecureLookupError::InvalidFilter(format!("'{k}': {e}")))
                })
                .collect::<Result<Vec<Regex>>>()?,
            _ => Vec::new(),
        };

        let keywords = if self.case_sensitive {
            self.keywords.clone()
        } else {
            self.keywords.iter().map(|k| k.to_lowercase()).collect()
        };

        Ok(Matcher {
            options: self,
            keywords,
            patterns,
        })
    }
}

pub(crate) struct Matcher<'a> {
    options: &'a FilterOptions,
    keywords: Vec<String>,
    patterns: Vec<Regex>,
}

impl Matcher<'_> {
    pub(crate) fn matches(&self, entry: &Entry) -> bool {
        if entry.is_backup() && !self.options.include_backups {
            return false;
        }
        if self.options.keywords.is_empty() {
            return true;
        }
        fields(entry, self.options.target).any(|field| self.matches_field(field))
    }

    fn matches_field(&self, field: &str) -> bool {
        if self.options.mode == MatchMode::Regex {
            return self.patterns.iter().any(|re| re.is_match(field));
        }

        let folded;
        let field = if self.options.case_sensitive {
            field
        } else {
            folded = field.to_lowercase();
            folded.as_str()
        };

        self.keywords.iter().any(|k| match self.options.mode {
            MatchMode::Equals => field == k.as_str(),
            MatchMode::Contains => field.contains(k.as_str()),
            MatchMode::StartsWith => field.starts_with(k.as_str()),
            MatchMode::EndsWith => field.ends_with(k.as_str()),
            MatchMode::Regex => false,
        })
    }
}

fn list(values: &Option<Vec<String>>) -> impl Iterator<Item = &str> {
    values.iter().flatten().map(String::as_str)
}

fn fields(entry: &Entry, target: FilterTarget) -> Box<dyn Iterator<Item = &str> + '_> {
    match target {
        FilterTarget::Name => Box::new(std::iter::once(entry.name.as_str())),
        FilterTarget::OriginalFileName => {
            Box::new(std::iter::once(entry.original_file_name.as_str()))
        }
        FilterTarget::ArchiveFileName => {
            Box::new(std::iter::once(entry.archive_file_name.as_str()))
        }
        FilterTarget::Urls => Box::new(list(&entry.urls)),
        FilterTarget::Notes => Box::new(list(&entry.notes)),
        FilterTarget::All => Box::new(
            [
                entry.name.as_str(),
                entry.original_file_name.as_str(),
                entry.archive_file_name.as_str(),
            ]
            .into_iter()
            .chain(list(&entry.urls))
            .chain(list(&entry.notes)),
        ),
    }
}
