//! `securelookup clean`: drop entries whose archive no longer exists.

use std::path::Path;

use crate::cli::output;
use crate::cli::{open_database, Cli};
use crate::errors::Result;

/// Execute the `clean` command.
pub fn execute(cli: &Cli, repo: &Path, remove_backups: bool) -> Result<()> {
    let (mut db, _) = open_database(cli)?;

    let report = db.store_mut().clean(repo, remove_backups)?;
    if report.is_empty() {
        output::info("Nothing to clean.");
        return Ok(());
    }

    db.save()?;

    output::success(&format!(
        "Removed {} dangling entries, {} backups and {} unused generated names",
        report.dangling_entries, report.backup_entries, report.generated_names
    ));
    Ok(())
}
