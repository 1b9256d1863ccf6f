//! `securelookup completions`: print a shell completion script.

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::Cli;
use crate::errors::Result;

/// Execute the `completions` command.
pub fn execute(shell: Shell) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write_script(shell, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

fn write_script(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, bin, out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Commands;
    use clap::Parser;

    #[test]
    fn script_covers_subcommands() {
        let mut buf = Vec::new();
        write_script(Shell::Bash, &mut buf).unwrap();
        let script = String::from_utf8(buf).unwrap();
        for word in ["securelookup", "passwd", "clean", "--show-passwords"] {
            assert!(script.contains(word), "missing {word}");
        }
    }

    #[test]
    fn shell_names_come_from_clap() {
        let cli = Cli::try_parse_from(["securelookup", "completions", "powershell"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions {
                shell: Shell::PowerShell
            }
        ));
        assert!(Cli::try_parse_from(["securelookup", "completions", "csh"]).is_err());
    }
}
