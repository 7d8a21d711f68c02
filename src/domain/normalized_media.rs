use std::path::PathBuf;

/// A canonical-profile audio artifact (mono 16 kHz MP3) plus its measured
/// duration. Produced once per job into the job's scratch directory; the
/// scratch directory owns its deletion.
#[derive(Debug, Clone)]
pub struct NormalizedMedia {
    pub path: PathBuf,
    pub duration_secs: f64,
}
