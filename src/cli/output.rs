//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::crypto::Algorithms;
use crate::vault::Entry;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of entries.  Passwords are masked unless `show_passwords`.
pub fn print_entries_table(entries: &[&Entry], show_passwords: bool) {
    if entries.is_empty() {
        info("No matching entries.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Name", "Original", "Archive", "Password", "Modified", "Notes",
    ]);

    for e in entries {
        let mut name = e.name.clone();
        if e.is_backup() {
            name.push_str(" (backup)");
        }
        let password = if show_passwords {
            e.password.clone()
        } else {
            "********".to_string()
        };
        let modified = e
            .last_modified
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        let mut notes: Vec<String> = e.urls.iter().flatten().cloned().collect();
        notes.extend(e.notes.iter().flatten().cloned());

        table.add_row(vec![
            name,
            e.original_file_name.clone(),
            e.archive_file_name.clone(),
            password,
            modified,
            notes.join("\n"),
        ]);
    }

    println!("{table}");
}

/// Print every registered algorithm, one table per family.
pub fn print_algorithms(algorithms: &Algorithms) {
    let families = [
        (
            algorithms.password_hashes.family(),
            algorithms.password_hashes.names(),
        ),
        (algorithms.ciphers.family(), algorithms.ciphers.names()),
        (
            algorithms.compressions.family(),
            algorithms.compressions.names(),
        ),
        (
            algorithms.integrity_hashes.family(),
            algorithms.integrity_hashes.names(),
        ),
    ];

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Family", "Algorithms"]);
    for (family, names) in families {
        table.add_row(vec![family.to_string(), names.join(", ")]);
    }
    println!("{table}");
}
