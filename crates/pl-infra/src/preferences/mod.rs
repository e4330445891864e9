//! Preferences store adapters.
mod file;
mod memory;

pub use file::{FileReaderPreferences, DEFAULT_PREFS_FILE};
pub use memory::InMemoryReaderPreferences;
