use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;

use recapd::application::ports::{HistoryStore, SettingsProvider, Summarizer, Transcriber};
use recapd::application::services::{JobPipeline, JobRegistry, PipelineConfig, WorkerPool};
use recapd::infrastructure::media::FfmpegConverter;
use recapd::infrastructure::observability::{init_tracing, TracingConfig};
use recapd::infrastructure::persistence::{JsonHistoryStore, JsonSettingsStore};
use recapd::infrastructure::speech::GeminiClient;
use recapd::presentation::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port: u16 = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let workers: usize = std::env::var("WORKER_COUNT")
        .ok()
        .and_then(|w| w.parse().ok())
        .unwrap_or(2);
    let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));

    init_tracing(TracingConfig::default(), port);

    let history_store: Arc<dyn HistoryStore> =
        Arc::new(JsonHistoryStore::new(data_dir.join("history.json"))?);
    let settings_store = Arc::new(JsonSettingsStore::new(data_dir.join("settings.json"))?);
    let converter = Arc::new(FfmpegConverter::new());
    let gemini = Arc::new(GeminiClient::new(std::env::var("GEMINI_BASE_URL").ok()));

    let (registry, receiver) = JobRegistry::new(Arc::clone(&history_store));
    registry.hydrate().await;

    let transcriber: Arc<dyn Transcriber> = gemini.clone();
    let summarizer: Arc<dyn Summarizer> = gemini.clone();
    let settings_provider: Arc<dyn SettingsProvider> = settings_store.clone();

    let pipeline = Arc::new(JobPipeline::new(
        Arc::clone(&registry),
        converter,
        transcriber,
        summarizer,
        settings_provider,
        PipelineConfig::default(),
    ));

    WorkerPool::spawn(workers, receiver, pipeline);
    tracing::info!(workers, "Worker pool started");

    let state = AppState {
        registry,
        settings_store,
        uploads_dir: data_dir.join("uploads"),
    };

    let router = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
