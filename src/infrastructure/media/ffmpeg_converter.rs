use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::application::ports::{MediaConverter, MediaError};
use crate::domain::{ChunkSpan, NormalizedMedia};

const TARGET_SAMPLE_RATE: u32 = 16_000;
const TARGET_CHANNELS: u8 = 1;
const TARGET_BITRATE: &str = "64k";
const NORMALIZED_FILENAME: &str = "normalized.mp3";

/// ffmpeg/ffprobe wrapper producing the canonical audio profile (mono,
/// 16 kHz, 64 kbps MP3), probing duration, and cutting chunk windows.
pub struct FfmpegConverter {
    ffmpeg_path: String,
    ffprobe_path: String,
    tool_timeout: Duration,
}

impl FfmpegConverter {
    pub fn new() -> Self {
        Self {
            ffmpeg_path: std::env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffprobe_path: std::env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            tool_timeout: Duration::from_secs(900),
        }
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    fn normalize_args(source: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-nostats".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            source.to_string_lossy().to_string(),
            "-vn".to_string(),
            "-ac".to_string(),
            TARGET_CHANNELS.to_string(),
            "-ar".to_string(),
            TARGET_SAMPLE_RATE.to_string(),
            "-c:a".to_string(),
            "libmp3lame".to_string(),
            "-b:a".to_string(),
            TARGET_BITRATE.to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    fn slice_args(input: &Path, span: ChunkSpan, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-nostats".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-ss".to_string(),
            format!("{:.3}", span.start_secs),
            "-t".to_string(),
            format!("{:.3}", span.duration_secs),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-c".to_string(),
            "copy".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    async fn run_tool(&self, program: &str, args: &[String]) -> Result<Output, MediaError> {
        tracing::debug!(program, ?args, "Running transcoder tool");

        let mut cmd = Command::new(program);
        cmd.args(args).env("LC_ALL", "C").kill_on_drop(true);

        let output = tokio::time::timeout(self.tool_timeout, cmd.output())
            .await
            .map_err(|_| {
                MediaError::ToolExecution(format!(
                    "{} timed out after {}s",
                    program,
                    self.tool_timeout.as_secs()
                ))
            })?
            .map_err(|e| MediaError::ToolExecution(format!("failed to run {}: {}", program, e)))?;

        Ok(output)
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64, MediaError> {
        let args = vec![
            "-v".to_string(),
            "error".to_string(),
            "-show_entries".to_string(),
            "format=duration".to_string(),
            "-of".to_string(),
            "csv=p=0".to_string(),
            path.to_string_lossy().to_string(),
        ];

        let output = self.run_tool(&self.ffprobe_path, &args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::UnsupportedMedia(first_line(&stderr)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .trim()
            .parse::<f64>()
            .map_err(|_| MediaError::UnsupportedMedia("media has no measurable duration".to_string()))
    }
}

impl Default for FfmpegConverter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaConverter for FfmpegConverter {
    async fn normalize(
        &self,
        source: &Path,
        scratch_dir: &Path,
    ) -> Result<NormalizedMedia, MediaError> {
        if !source.exists() {
            return Err(MediaError::ToolExecution(format!(
                "source file does not exist: {}",
                source.display()
            )));
        }

        let output_path = scratch_dir.join(NORMALIZED_FILENAME);
        let args = Self::normalize_args(source, &output_path);
        let output = self.run_tool(&self.ffmpeg_path, &args).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_decode_failure(&stderr) {
                return Err(MediaError::UnsupportedMedia(first_line(&stderr)));
            }
            return Err(MediaError::ToolExecution(format!(
                "ffmpeg exited with {}: {}",
                output.status.code().unwrap_or(-1),
                first_line(&stderr)
            )));
        }

        let duration_secs = self.probe_duration(&output_path).await?;
        tracing::info!(
            path = %output_path.display(),
            duration_secs,
            "Normalized media to mono {} Hz MP3",
            TARGET_SAMPLE_RATE
        );

        Ok(NormalizedMedia {
            path: output_path,
            duration_secs,
        })
    }

    async fn slice(
        &self,
        media: &NormalizedMedia,
        span: ChunkSpan,
        scratch_dir: &Path,
    ) -> Result<PathBuf, MediaError> {
        let output_path = scratch_dir.join(format!("chunk_{:03}.mp3", span.index));
        let args = Self::slice_args(&media.path, span, &output_path);
        let output = self.run_tool(&self.ffmpeg_path, &args).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::ToolExecution(format!(
                "ffmpeg chunk cut exited with {}: {}",
                output.status.code().unwrap_or(-1),
                first_line(&stderr)
            )));
        }

        tracing::debug!(
            index = span.index,
            start = span.start_secs,
            duration = span.duration_secs,
            "Cut audio chunk"
        );

        Ok(output_path)
    }
}

fn is_decode_failure(stderr: &str) -> bool {
    stderr.contains("Invalid data found when processing input")
        || stderr.contains("does not contain any stream")
        || stderr.contains("Output file does not contain any stream")
        || stderr.contains("could not find codec")
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or("unknown error").to_string()
}
