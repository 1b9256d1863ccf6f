//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{Result, SecureLookupError};
use crate::vault::{Database, FilterTarget, MatchMode};

/// Environment variable holding the master password (CI/CD, scripts).
pub const PASSWORD_ENV: &str = "SECURELOOKUP_PASSWORD";

/// Environment variable holding the new password for `passwd`.
pub const NEW_PASSWORD_ENV: &str = "SECURELOOKUP_NEW_PASSWORD";

/// SecureLookup CLI: password-protected lookup table for obfuscated archives.
#[derive(Parser)]
#[command(
    name = "securelookup",
    about = "Password-protected lookup table for obfuscated archives",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database file (default: `database` from .securelookup.toml)
    #[arg(long, env = "SECURELOOKUP_DB", global = true)]
    pub db: Option<PathBuf>,
}

/// Algorithm overrides for `init`.  Anything not given comes from
/// `.securelookup.toml` or the built-in defaults.
#[derive(clap::Args, Debug, Default)]
pub struct InitArgs {
    /// Primary password hashing algorithm (e.g. Argon2id, scrypt)
    #[arg(long, env = "SECURELOOKUP_PRIMARY_HASHING")]
    pub primary_hashing: Option<String>,

    /// Primary hashing properties (k=v;k=v)
    #[arg(long, env = "SECURELOOKUP_PRIMARY_PROPERTIES")]
    pub primary_properties: Option<String>,

    /// Initial primary hash size in bytes (32-128)
    #[arg(long)]
    pub primary_hash_size: Option<usize>,

    /// Secondary password hashing algorithm
    #[arg(long, env = "SECURELOOKUP_SECONDARY_HASHING")]
    pub secondary_hashing: Option<String>,

    /// Secondary hashing properties (k=v;k=v)
    #[arg(long, env = "SECURELOOKUP_SECONDARY_PROPERTIES")]
    pub secondary_properties: Option<String>,

    /// Compression algorithm (None, Deflate, GZip, Zstd, LZ4)
    #[arg(long, env = "SECURELOOKUP_COMPRESSION")]
    pub compression: Option<String>,

    /// Compression properties (e.g. x=9)
    #[arg(long, env = "SECURELOOKUP_COMPRESSION_PROPERTIES")]
    pub compression_properties: Option<String>,

    /// Integrity hash algorithm (e.g. SHA3-512, BLAKE3)
    #[arg(long, env = "SECURELOOKUP_INTEGRITY_HASH")]
    pub integrity_hash: Option<String>,

    /// Encryption algorithm (e.g. AES-GCM, XChaCha20-Poly1305)
    #[arg(long, env = "SECURELOOKUP_CIPHER")]
    pub cipher: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new database
    Init(InitArgs),

    /// Add an entry (a same-name entry is kept as a backup)
    Add {
        /// Entry name
        name: String,

        /// Archive file name (generated if omitted)
        #[arg(short, long)]
        archive: Option<String>,

        /// Original file or directory name
        #[arg(short, long)]
        original: Option<String>,

        /// Archive password (generated if omitted)
        #[arg(short, long)]
        password: Option<String>,

        /// Associated URL (repeatable)
        #[arg(long = "url")]
        urls: Vec<String>,

        /// Note (repeatable)
        #[arg(long = "note")]
        notes: Vec<String>,

        /// Directory the archive will live in; generated names avoid files there
        #[arg(long)]
        repo: Option<PathBuf>,
    },

    /// Search entries
    Find {
        /// Keywords (any may match; none lists everything)
        keywords: Vec<String>,

        /// How keywords are matched
        #[arg(short, long, value_enum, default_value_t = MatchMode::Contains)]
        mode: MatchMode,

        /// Which fields are searched
        #[arg(short, long, value_enum, default_value_t = FilterTarget::All)]
        target: FilterTarget,

        /// Match case exactly
        #[arg(long)]
        case_sensitive: bool,

        /// Include entries kept as backups
        #[arg(long)]
        backups: bool,

        /// Print archive passwords
        #[arg(long)]
        show_passwords: bool,
    },

    /// Remove an entry
    Drop {
        /// Entry name
        name: String,

        /// Also remove backups with this name
        #[arg(long)]
        backups: bool,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Remove entries whose archive is gone and forget unused generated names
    Clean {
        /// Directory holding the archives
        repo: PathBuf,

        /// Also remove every backup entry
        #[arg(long)]
        backups: bool,
    },

    /// Change the master password (and optionally the cipher)
    Passwd {
        /// Switch to this encryption algorithm
        #[arg(long)]
        cipher: Option<String>,
    },

    /// Export the decrypted entries as JSON (unencrypted!)
    Export {
        /// Output file path
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// List the available algorithms
    Algorithms,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load settings from the current directory and work out the database path.
pub fn resolve(cli: &Cli) -> Result<(PathBuf, Settings)> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    let path = match &cli.db {
        Some(db) => db.clone(),
        None => settings.database_path(&cwd),
    };
    Ok((path, settings))
}

/// Prompt for the master password and open the database.
pub fn open_database(cli: &Cli) -> Result<(Database, Settings)> {
    let (path, settings) = resolve(cli)?;
    if !path.exists() {
        output::tip("Run `securelookup init` to create a database.");
        return Err(SecureLookupError::DatabaseNotFound(path));
    }

    let password = prompt_password()?;
    let mut db = Database::load(&path, &password)?;
    db.set_backup_on_save(settings.backup_on_save);
    Ok((db, settings))
}

/// Save only when something changed.
pub fn save_if_dirty(db: &mut Database) -> Result<bool> {
    if !db.is_dirty() {
        return Ok(false);
    }
    db.save()?;
    Ok(true)
}

/// Get the master password, trying in order:
/// 1. `SECURELOOKUP_PASSWORD` env var (CI/CD)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env(PASSWORD_ENV) {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter database password")
        .interact()
        .map_err(|e| SecureLookupError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new password with confirmation.
///
/// `env_var` is checked first for scripted usage.  Only the property-bag
/// delimiter is rejected; strength is up to the user.
pub fn prompt_new_password(env_var: &str) -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env(env_var) {
        crate::crypto::validate_password(&pw)?;
        return Ok(pw);
    }

    loop {
        let password = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Choose database password")
                .with_confirmation(
                    "Confirm database password",
                    "Passwords do not match, try again",
                )
                .interact()
                .map_err(|e| SecureLookupError::CommandFailed(format!("password prompt: {e}")))?,
        );

        if let Err(e) = crate::crypto::validate_password(&password) {
            output::warning(&format!("{e}. Try again."));
            continue;
        }

        return Ok(password);
    }
}

fn password_from_env(var: &str) -> Option<Zeroizing<String>> {
    std::env::var(var)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_find_options() {
        let cli = Cli::try_parse_from([
            "securelookup",
            "find",
            "bank",
            "--mode",
            "starts-with",
            "--target",
            "archive-file-name",
            "--backups",
        ])
        .unwrap();
        match cli.command {
            Commands::Find {
                keywords,
                mode,
                target,
                backups,
                ..
            } => {
                assert_eq!(keywords, vec!["bank"]);
                assert_eq!(mode, MatchMode::StartsWith);
                assert_eq!(target, FilterTarget::ArchiveFileName);
                assert!(backups);
            }
            _ => panic!("expected find"),
        }
    }

    #[test]
    fn add_collects_repeated_urls() {
        let cli = Cli::try_parse_from([
            "securelookup",
            "--db",
            "x.db",
            "add",
            "bank",
            "--url",
            "https://a",
            "--url",
            "https://b",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
        match cli.command {
            Commands::Add { urls, .. } => assert_eq!(urls.len(), 2),
            _ => panic!("expected add"),
        }
    }
}
