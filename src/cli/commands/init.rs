//! `securelookup init`: create a new, empty database.

use crate::cli::output;
use crate::cli::{prompt_new_password, resolve, Cli, InitArgs, PASSWORD_ENV};
use crate::errors::{Result, SecureLookupError};
use crate::vault::{CreationParams, Database};

/// Execute the `init` command.
pub fn execute(cli: &Cli, args: &InitArgs) -> Result<()> {
    let (path, settings) = resolve(cli)?;

    // 1. Refuse to overwrite an existing database.
    if path.exists() {
        output::tip("Use `securelookup add` to add entries to the existing database.");
        return Err(SecureLookupError::DatabaseAlreadyExists(path));
    }

    // 2. Settings first, then command-line overrides.
    let params = apply_overrides(settings.creation_params(), args);

    // 3. Create the parent directory if needed.
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
            output::info(&format!("Created directory: {}", parent.display()));
        }
    }

    // 4. Prompt for a new password (with confirmation) and create the file.
    let password = prompt_new_password(PASSWORD_ENV)?;
    let db = Database::create(&path, &password, &params)?;

    let env = db.envelope();
    output::success(&format!("Database created at {}", path.display()));
    output::info(&format!(
        "{} + {} / {} / {} / {}",
        env.primary_password_hashing.algorithm,
        env.secondary_password_hashing.algorithm,
        env.encryption.algorithm,
        env.compression.algorithm,
        env.hash.algorithm
    ));
    output::tip("Run `securelookup add <NAME>` to add an entry.");

    Ok(())
}

/// Overlay the algorithm choices given on the command line.
fn apply_overrides(mut params: CreationParams, args: &InitArgs) -> CreationParams {
    // A new algorithm without new properties falls back to its defaults
    // rather than inheriting another algorithm's properties.
    if let Some(alg) = &args.primary_hashing {
        params.primary_hashing.algorithm = alg.clone();
        params.primary_hashing.properties = None;
    }
    if let Some(props) = &args.primary_properties {
        params.primary_hashing.properties = Some(props.clone());
    }
    if let Some(size) = args.primary_hash_size {
        params.primary_hash_size = size;
    }
    if let Some(alg) = &args.secondary_hashing {
        params.secondary_hashing.algorithm = alg.clone();
        params.secondary_hashing.properties = None;
    }
    if let Some(props) = &args.secondary_properties {
        params.secondary_hashing.properties = Some(props.clone());
    }
    if let Some(alg) = &args.compression {
        params.compression.algorithm = alg.clone();
        params.compression.properties = None;
    }
    if let Some(props) = &args.compression_properties {
        params.compression.properties = Some(props.clone());
    }
    if let Some(alg) = &args.integrity_hash {
        params.integrity_hash = alg.clone();
    }
    if let Some(alg) = &args.cipher {
        params.encryption = alg.clone();
    }
    params
}
