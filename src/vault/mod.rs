//! Vault module: the encrypted lookup table.
//!
//! This module provides:
//! - `Entry` and `EntryFlags` types (`entry`)
//! - The decrypted `InnerStore` and its entry lifecycle (`inner`, `filter`)
//! - Random archive names (`names`)
//! - The JSON envelope document and atomic file writes (`format`)
//! - Creation parameters (`params`)
//! - The `Database` handle that runs save / load / change-password (`store`)

pub mod entry;
pub mod filter;
pub mod format;
pub mod inner;
pub mod names;
pub mod params;
pub mod store;

// Re-export the most commonly used items.
pub use entry::{Entry, EntryFlags};
pub use filter::{FilterOptions, FilterTarget, MatchMode};
pub use format::Envelope;
pub use inner::{CleanReport, InnerStore};
pub use names::NameDictionary;
pub use params::{AlgorithmChoice, CreationParams};
pub use store::Database;
