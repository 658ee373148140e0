pub mod base_storage;
pub mod file_storage;
mod migration;

pub use base_storage::SettingsStorage;
pub use file_storage::{FileSettingsStore, PersistedEnvelope};
pub use migration::carry_over_values;

/// File holding the persisted envelope, one per host application.
pub const SETTINGS_FILE: &str = "settings_schema.json";

/// Envelope version written when nothing was read before.
pub const ENVELOPE_VERSION: u32 = 1;
