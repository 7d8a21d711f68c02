use std::path::PathBuf;
use std::sync::Arc;

use crate::application::services::JobRegistry;
use crate::infrastructure::persistence::JsonSettingsStore;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<JobRegistry>,
    pub settings_store: Arc<JsonSettingsStore>,
    /// Where incoming uploads are staged until their job deletes them.
    pub uploads_dir: PathBuf,
}
