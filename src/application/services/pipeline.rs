use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tracing::Instrument;

use crate::application::ports::{
    MediaConverter, MediaError, SettingsError, SettingsProvider, SpeechError, SpeechRequest,
    Summarizer, Transcriber,
};
use crate::domain::{plan_chunks, ChunkPlan, NormalizedMedia};

use super::job_registry::{JobRegistry, SubmitRequest};
use super::transcript_assembler::{assemble_transcript, AssemblyError, ChunkTranscript};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Fixed throttle between successive transcription calls on the same
    /// job. This is pacing against the external rate limit, not backoff.
    pub inter_call_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inter_call_delay: Duration::from_secs(2),
        }
    }
}

/// Drives one job end-to-end: normalize and probe, plan chunks, transcribe
/// (single call or sequential chunk calls), assemble, summarize, finalize.
/// Scratch artifacts live in a per-job temporary directory released on every
/// exit path; the source upload is removed on every exit path too.
pub struct JobPipeline {
    registry: Arc<JobRegistry>,
    converter: Arc<dyn MediaConverter>,
    transcriber: Arc<dyn Transcriber>,
    summarizer: Arc<dyn Summarizer>,
    settings: Arc<dyn SettingsProvider>,
    config: PipelineConfig,
}

impl JobPipeline {
    pub fn new(
        registry: Arc<JobRegistry>,
        converter: Arc<dyn MediaConverter>,
        transcriber: Arc<dyn Transcriber>,
        summarizer: Arc<dyn Summarizer>,
        settings: Arc<dyn SettingsProvider>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            registry,
            converter,
            transcriber,
            summarizer,
            settings,
            config,
        }
    }

    pub async fn run(&self, request: SubmitRequest) {
        let span = tracing::info_span!("job", job_id = %request.job_id);
        self.run_inner(request).instrument(span).await;
    }

    async fn run_inner(&self, request: SubmitRequest) {
        let job_id = request.job_id;
        self.registry.begin_processing(job_id);

        match self.execute(&request).await {
            Ok((transcript, summary)) => {
                self.registry
                    .update_progress(job_id, 95, "Saving results");
                self.registry.complete(job_id, transcript, summary).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Pipeline failed");
                self.registry.fail(job_id, e.user_message()).await;
            }
        }

        match tokio::fs::remove_file(&request.source_path).await {
            Ok(()) => tracing::debug!(path = %request.source_path.display(), "Removed source upload"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %request.source_path.display(),
                    error = %e,
                    "Failed to remove source upload"
                );
            }
        }
    }

    async fn execute(&self, request: &SubmitRequest) -> Result<(String, String), PipelineError> {
        let job_id = request.job_id;
        let settings = self.settings.snapshot().await?;
        let scratch = TempDir::new().map_err(PipelineError::Scratch)?;

        self.registry
            .update_progress(job_id, 5, "Normalizing audio");
        let media = self
            .converter
            .normalize(&request.source_path, scratch.path())
            .await?;
        tracing::info!(duration_secs = media.duration_secs, "Media normalized");

        let plan = plan_chunks(media.duration_secs, settings.max_chunk_secs);
        self.registry.update_progress(
            job_id,
            20,
            format!("Audio ready ({:.0}s, {} segment(s))", media.duration_secs, plan.len()),
        );

        let speech_request = SpeechRequest {
            model: &settings.model,
            api_key: &settings.api_key,
            prompt: &settings.transcription_prompt,
        };

        let transcript = if plan.is_single() {
            self.registry.update_progress(job_id, 25, "Transcribing");
            let text = self
                .transcriber
                .transcribe(&media.path, speech_request)
                .await
                .map_err(PipelineError::Transcription)?;
            self.registry
                .update_progress(job_id, 80, "Transcription complete");
            text
        } else {
            self.transcribe_chunks(request, &media, &plan, speech_request, scratch.path())
                .await?
        };

        self.registry
            .update_progress(job_id, 85, "Generating summary");
        let summary = self
            .summarizer
            .summarize(
                &transcript,
                SpeechRequest {
                    prompt: &settings.summary_prompt,
                    ..speech_request
                },
            )
            .await
            .map_err(PipelineError::Summarization)?;

        Ok((transcript, summary))
        // scratch drops here, removing the normalized artifact and any chunks
    }

    /// Transcribe chunk by chunk, strictly in index order and never
    /// concurrently, pacing successive calls to respect external rate limits.
    async fn transcribe_chunks(
        &self,
        request: &SubmitRequest,
        media: &NormalizedMedia,
        plan: &ChunkPlan,
        speech_request: SpeechRequest<'_>,
        scratch_dir: &std::path::Path,
    ) -> Result<String, PipelineError> {
        let total = plan.len();
        let mut parts = Vec::with_capacity(total);

        for span in plan.spans() {
            if span.index > 0 {
                tokio::time::sleep(self.config.inter_call_delay).await;
            }

            self.registry.update_progress(
                request.job_id,
                chunk_progress(span.index, total),
                format!("Transcribing segment {}/{}", span.index + 1, total),
            );

            let chunk_path = self.converter.slice(media, *span, scratch_dir).await?;
            let text = self
                .transcriber
                .transcribe(&chunk_path, speech_request)
                .await
                .map_err(PipelineError::Transcription)?;

            parts.push(ChunkTranscript {
                index: span.index,
                text,
            });

            self.registry.update_progress(
                request.job_id,
                chunk_progress(span.index + 1, total),
                format!("Transcribed segment {}/{}", span.index + 1, total),
            );
        }

        Ok(assemble_transcript(parts)?)
    }
}

/// Map completed-chunk count onto the 20-80 transcription band, subdivided
/// evenly across the plan.
fn chunk_progress(completed: usize, total: usize) -> u8 {
    20 + ((completed * 60) / total.max(1)) as u8
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("media: {0}")]
    Media(#[from] MediaError),
    #[error("transcription: {0}")]
    Transcription(SpeechError),
    #[error("summarization: {0}")]
    Summarization(SpeechError),
    #[error("assembly: {0}")]
    Assembly(#[from] AssemblyError),
    #[error("settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("scratch dir: {0}")]
    Scratch(std::io::Error),
}

impl PipelineError {
    /// Concise, user-safe failure description for the job record. Never
    /// includes internal detail or stack-like output.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Media(MediaError::UnsupportedMedia(_)) => {
                "Unsupported media format: the file could not be decoded as audio or video."
                    .to_string()
            }
            PipelineError::Media(_) => {
                "Audio conversion failed while preparing the file.".to_string()
            }
            PipelineError::Transcription(SpeechError::Rejected(_)) => {
                "The transcription service rejected the request.".to_string()
            }
            PipelineError::Transcription(_) => {
                "The transcription service is currently unavailable. Please try again later."
                    .to_string()
            }
            PipelineError::Summarization(SpeechError::Rejected(_)) => {
                "The summarization service rejected the request.".to_string()
            }
            PipelineError::Summarization(_) => {
                "The summarization service is currently unavailable. Please try again later."
                    .to_string()
            }
            PipelineError::Assembly(_) => {
                "An internal error occurred while assembling the transcript.".to_string()
            }
            PipelineError::Settings(_) => {
                "Service configuration could not be read.".to_string()
            }
            PipelineError::Scratch(_) => {
                "Temporary storage could not be allocated.".to_string()
            }
        }
    }
}
