//! One module per subcommand.  Each exposes an `execute` function that
//! `main` dispatches to.

pub mod add;
pub mod algorithms;
pub mod clean;
pub mod completions;
pub mod drop;
pub mod export;
pub mod find;
pub mod init;
pub mod passwd;
