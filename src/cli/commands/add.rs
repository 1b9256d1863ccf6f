//! `securelookup add`: add an entry, generating an archive name and
//! password when they are not given.

use std::path::Path;

use crate::cli::output;
use crate::cli::{open_database, Cli};
use crate::errors::Result;
use crate::vault::{Entry, NameDictionary};

/// Length of generated archive passwords.
const GENERATED_PASSWORD_LEN: usize = 48;

/// Everything `add` takes from the command line.
pub struct AddArgs<'a> {
    pub name: &'a str,
    pub archive: Option<&'a str>,
    pub original: Option<&'a str>,
    pub password: Option<&'a str>,
    pub urls: &'a [String],
    pub notes: &'a [String],
    pub repo: Option<&'a Path>,
}

/// Execute the `add` command.
pub fn execute(cli: &Cli, args: AddArgs<'_>) -> Result<()> {
    let (mut db, settings) = open_database(cli)?;

    // 1. Archive name: as given, or freshly generated and reserved.
    let archive = match args.archive {
        Some(name) => name.to_string(),
        None => {
            let dictionary = settings.name_dictionary()?;
            let name =
                db.store_mut()
                    .generate_name(args.repo, settings.name_length, &dictionary)?;
            output::info(&format!("Generated archive name: {name}"));
            name
        }
    };

    // 2. Archive password: as given, or random.
    let password = match args.password {
        Some(pw) => pw.to_string(),
        None => NameDictionary::default().random_string(GENERATED_PASSWORD_LEN),
    };

    let entry = Entry::new(args.name, archive, password)
        .with_original_file_name(args.original.unwrap_or_default())
        .with_urls(args.urls.to_vec())
        .with_notes(args.notes.to_vec());

    // 3. Add (an older entry with the same name becomes a backup) and save.
    let superseded = db.store_mut().add_entry(entry);
    db.save()?;

    if superseded {
        output::warning(&format!(
            "An entry named '{}' already existed; it was kept as a backup.",
            args.name
        ));
    }
    output::success(&format!("Added entry '{}'", args.name));
    if args.password.is_none() {
        output::tip(
            "Run `securelookup find <NAME> --show-passwords` to see the generated password.",
        );
    }

    Ok(())
}
