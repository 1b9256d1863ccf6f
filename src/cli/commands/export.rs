//! `securelookup export`: write the decrypted entries as plain JSON.

use std::path::Path;

use crate::cli::output;
use crate::cli::{open_database, Cli};
use crate::errors::{Result, SecureLookupError};

/// Execute the `export` command.
pub fn execute(cli: &Cli, dest: &Path, force: bool) -> Result<()> {
    if dest.exists() && !force {
        return Err(SecureLookupError::CommandFailed(format!(
            "{} already exists (pass --force to overwrite)",
            dest.display()
        )));
    }

    let (db, _) = open_database(cli)?;

    // Safety: refuse to export over the database itself.
    if dest == db.path() {
        return Err(SecureLookupError::CommandFailed(
            "refusing to export over the database file".into(),
        ));
    }

    db.export(dest)?;

    output::success(&format!(
        "Exported {} entries to {}",
        db.store().len(),
        dest.display()
    ));
    output::warning("The export is NOT encrypted. Delete it when you are done.");
    Ok(())
}
