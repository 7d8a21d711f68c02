use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::presentation::state::AppState;

/// Settings as exposed to clients. The API key itself is write-only; reads
/// report only whether one is configured.
#[derive(Serialize)]
pub struct SettingsResponse {
    pub model: String,
    pub transcription_prompt: String,
    pub summary_prompt: String,
    pub max_duration_seconds: u64,
    pub api_key_set: bool,
}

#[derive(Deserialize, Default)]
pub struct UpdateSettingsRequest {
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub transcription_prompt: Option<String>,
    pub summary_prompt: Option<String>,
    pub max_duration_seconds: Option<u64>,
}

#[tracing::instrument(skip(state))]
pub async fn get_settings_handler(State(state): State<AppState>) -> impl IntoResponse {
    let settings = state.settings_store.load().await;
    (
        StatusCode::OK,
        Json(SettingsResponse {
            model: settings.model,
            transcription_prompt: settings.transcription_prompt,
            summary_prompt: settings.summary_prompt,
            max_duration_seconds: settings.max_duration_seconds,
            api_key_set: !settings.api_key.is_empty(),
        }),
    )
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Partial update: only the provided fields change. Jobs already running
/// keep the snapshot they started with.
#[tracing::instrument(skip(state, request))]
pub async fn update_settings_handler(
    State(state): State<AppState>,
    Json(request): Json<UpdateSettingsRequest>,
) -> impl IntoResponse {
    let mut settings = state.settings_store.load().await;

    if let Some(model) = request.model {
        settings.model = model;
    }
    if let Some(api_key) = request.api_key {
        settings.api_key = api_key;
    }
    if let Some(prompt) = request.transcription_prompt {
        settings.transcription_prompt = prompt;
    }
    if let Some(prompt) = request.summary_prompt {
        settings.summary_prompt = prompt;
    }
    if let Some(max_duration) = request.max_duration_seconds {
        settings.max_duration_seconds = max_duration;
    }

    if let Err(e) = state.settings_store.save(&settings).await {
        tracing::error!(error = %e, "Failed to save settings");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to save settings".to_string(),
            }),
        )
            .into_response();
    }

    tracing::info!("Settings updated");
    (
        StatusCode::OK,
        Json(SettingsResponse {
            model: settings.model,
            transcription_prompt: settings.transcription_prompt,
            summary_prompt: settings.summary_prompt,
            max_duration_seconds: settings.max_duration_seconds,
            api_key_set: !settings.api_key.is_empty(),
        }),
    )
        .into_response()
}
