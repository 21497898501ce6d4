//! sqlrun config - settings persistence and script discovery
//!
//! Persisted connection settings plus the script-folder listing the CLI
//! turns into a run.

mod discover;
mod settings;
mod store;

pub use discover::discover_scripts;
pub use settings::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SERVICE, Settings};
pub use store::SettingsStore;
