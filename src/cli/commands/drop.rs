//! `securelookup drop`: remove an entry.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{open_database, save_if_dirty, Cli};
use crate::errors::{Result, SecureLookupError};

/// Execute the `drop` command.
pub fn execute(cli: &Cli, name: &str, include_backups: bool, force: bool) -> Result<()> {
    let (mut db, _) = open_database(cli)?;

    if db.store().get(name).is_none() && !include_backups {
        return Err(SecureLookupError::EntryNotFound(name.to_string()));
    }

    // Unless --force is set, ask for confirmation before removing.
    if !force {
        let what = if include_backups {
            format!("Remove entry '{name}' and its backups?")
        } else {
            format!("Remove entry '{name}'?")
        };
        let confirmed = Confirm::new()
            .with_prompt(what)
            .default(false)
            .interact()
            .map_err(|e| SecureLookupError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let removed = db.store_mut().remove(name, include_backups)?;
    save_if_dirty(&mut db)?;

    let noun = if removed == 1 { "entry" } else { "entries" };
    output::success(&format!("Removed {removed} {noun} named '{name}'"));
    Ok(())
}
