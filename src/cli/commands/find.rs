//! `securelookup find`: search entries.

use crate::cli::output;
use crate::cli::{open_database, Cli};
use crate::errors::Result;
use crate::vault::FilterOptions;

/// Execute the `find` command.
pub fn execute(cli: &Cli, options: &FilterOptions, show_passwords: bool) -> Result<()> {
    let (db, _) = open_database(cli)?;

    let found = db.store().filter(options)?;
    output::info(&format!(
        "{} of {} entr{} matched",
        found.len(),
        db.store().len(),
        if db.store().len() == 1 { "y" } else { "ies" }
    ));
    output::print_entries_table(&found, show_passwords);

    Ok(())
}
