//! Project configuration (`.securelookup.toml`).

pub mod settings;

pub use settings::Settings;
