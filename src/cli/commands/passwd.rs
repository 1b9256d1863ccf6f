//! `securelookup passwd`: change the master password.
//!
//! Re-randomizes the primary salt and primary hash size, re-derives the
//! primary hash from the new password, optionally switches the cipher,
//! and rewrites the file.

use crate::cli::output;
use crate::cli::{open_database, prompt_new_password, Cli, NEW_PASSWORD_ENV};
use crate::errors::Result;

/// Execute the `passwd` command.
pub fn execute(cli: &Cli, cipher: Option<&str>) -> Result<()> {
    // 1. Open the database with the current password.
    output::info("Enter your current database password.");
    let (mut db, _) = open_database(cli)?;

    // 2. Prompt for the new password.
    output::info("Choose your new database password.");
    let new_password = prompt_new_password(NEW_PASSWORD_ENV)?;

    // 3. Re-key and save.
    db.change_password(&new_password, cipher)?;

    output::success(&format!(
        "Password changed ({} entries re-encrypted with {})",
        db.store().len(),
        db.envelope().encryption.algorithm
    ));
    Ok(())
}
