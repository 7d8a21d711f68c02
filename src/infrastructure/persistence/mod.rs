mod json_history_store;
mod json_settings_store;

pub use json_history_store::JsonHistoryStore;
pub use json_settings_store::{JsonSettingsStore, StoredSettings};
