use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::Mutex;

use crate::application::ports::{SettingsError, SettingsProvider, SettingsSnapshot};

const API_KEY_ENV: &str = "GEMINI_API_KEY";

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_max_duration() -> u64 {
    3600
}

fn default_transcription_prompt() -> String {
    "You are a highly accurate verbatim transcription service. Transcribe the \
     provided audio exactly as spoken, including filler words, pauses, false \
     starts, and grammatical errors. Do not paraphrase, interpret, or \
     summarize. Output only the raw transcript with no headings, \
     introductions, or commentary."
        .to_string()
}

fn default_summary_prompt() -> String {
    "You are an expert corporate summarizer specializing in professional \
     minutes of meetings and executive summaries for senior stakeholders. \
     Analyze the provided transcript and produce a concise, well-structured, \
     formal summary in markdown, covering: meeting objective, key discussion \
     points, decisions made, action items with owners and deadlines, \
     participants, and next steps. Maintain an objective tone. Start directly \
     with the formatted summary, with no introductory phrases, closing \
     remarks, or meta-commentary."
        .to_string()
}

/// Settings exactly as they live on disk. Every field has a default so a
/// partial or missing file still yields a usable configuration, and the
/// duration threshold is parsed into its numeric type here, once, rather
/// than at each comparison site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSettings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_transcription_prompt")]
    pub transcription_prompt: String,
    #[serde(default = "default_summary_prompt")]
    pub summary_prompt: String,
    #[serde(
        default = "default_max_duration",
        deserialize_with = "lenient_duration"
    )]
    pub max_duration_seconds: u64,
}

impl Default for StoredSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: String::new(),
            transcription_prompt: default_transcription_prompt(),
            summary_prompt: default_summary_prompt(),
            max_duration_seconds: default_max_duration(),
        }
    }
}

/// Accepts a number or a numeric string; anything else falls back to the
/// default threshold instead of poisoning the whole settings file.
fn lenient_duration<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(parsed.unwrap_or_else(|| {
        tracing::warn!(value = %value, "Invalid max_duration_seconds; using default");
        default_max_duration()
    }))
}

/// JSON settings file with defaults. The file is created on first load so
/// operators can edit it in place; the API key can always be overridden by
/// the environment.
pub struct JsonSettingsStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonSettingsStore {
    pub fn new(path: PathBuf) -> Result<Self, SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub async fn load(&self) -> StoredSettings {
        let _guard = self.lock.lock().await;

        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let defaults = StoredSettings::default();
                if let Err(e) = self.write(&defaults).await {
                    tracing::warn!(error = %e, "Failed to create default settings file");
                }
                return defaults;
            }
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to read settings; using defaults");
                return StoredSettings::default();
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Corrupt settings file; using defaults");
                StoredSettings::default()
            }
        }
    }

    pub async fn save(&self, settings: &StoredSettings) -> Result<(), SettingsError> {
        let _guard = self.lock.lock().await;
        self.write(settings).await
    }

    async fn write(&self, settings: &StoredSettings) -> Result<(), SettingsError> {
        let raw = serde_json::to_vec_pretty(settings)
            .map_err(|e| SettingsError::Corrupt(e.to_string()))?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, raw).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsProvider for JsonSettingsStore {
    async fn snapshot(&self) -> Result<SettingsSnapshot, SettingsError> {
        let settings = self.load().await;

        // Environment takes precedence over the stored key.
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .unwrap_or(settings.api_key);

        Ok(SettingsSnapshot {
            model: settings.model,
            transcription_prompt: settings.transcription_prompt,
            summary_prompt: settings.summary_prompt,
            max_chunk_secs: settings.max_duration_seconds as f64,
            api_key,
        })
    }
}
