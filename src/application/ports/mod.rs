mod history_store;
mod media_converter;
mod settings_provider;
mod speech_client;

pub use history_store::{HistoryStore, HistoryStoreError};
pub use media_converter::{MediaConverter, MediaError};
pub use settings_provider::{SettingsError, SettingsProvider, SettingsSnapshot};
pub use speech_client::{ApiFailure, SpeechError, SpeechRequest, Summarizer, Transcriber};
