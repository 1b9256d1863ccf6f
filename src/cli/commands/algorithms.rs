//! `securelookup algorithms`: list every registered algorithm.

use crate::cli::output;
use crate::crypto::Algorithms;
use crate::errors::Result;

/// Execute the `algorithms` command.
pub fn execute() -> Result<()> {
    output::print_algorithms(&Algorithms::shared());
    output::tip("Algorithm names are case-insensitive.");
    Ok(())
}
