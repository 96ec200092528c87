//! Configuration and persisted touch settings
//!
//! - **editor**: `EditorConfig`, gesture tuning and layout heuristics (JSON)
//! - **store**: the `SettingsStore` boundary and its key/value encoding
//! - **preferences**: in-memory and JSON-file key/value backends

pub mod editor;
pub mod preferences;
pub mod store;

pub use editor::EditorConfig;
pub use preferences::{JsonFilePreferences, MemoryPreferences};
pub use store::{PreferenceBackend, PreferencesStore, SettingsStore};
