//! Joins per-paper audio summaries into a single episode.

mod ffmpeg;
mod wav;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

pub use ffmpeg::FfmpegMerger;
pub use wav::WavMerger;

/// Silence inserted between consecutive segments
pub const SILENCE_GAP: Duration = Duration::from_millis(1000);

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("no audio inputs to merge")]
    NoInputs,
    #[error("audio input not found: {}", path.display())]
    MissingInput { path: PathBuf },
    #[error("failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
    #[error("audio format of {} differs from the first input", path.display())]
    FormatMismatch { path: PathBuf },
    #[error("failed to encode {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },
    #[error("ffmpeg exited with {status}: {stderr}")]
    Ffmpeg { status: String, stderr: String },
    #[error("ffmpeg binary not found: {0}")]
    FfmpegNotFound(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Concatenates audio files in order with [`SILENCE_GAP`] between them.
///
/// Merging is blocking work; async callers should run it on a blocking
/// thread.
pub trait AudioMerger {
    fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<PathBuf, MergeError>;
}

/// Rejects empty input and inputs that do not exist on disk
fn ensure_inputs(inputs: &[PathBuf]) -> Result<(), MergeError> {
    if inputs.is_empty() {
        return Err(MergeError::NoInputs);
    }
    if let Some(path) = inputs.iter().find(|path| !path.is_file()) {
        return Err(MergeError::MissingInput { path: path.clone() });
    }
    Ok(())
}

/// A lone segment needs no gap, so the episode is the segment itself.
/// Callers decode `input` first; a copy never checks the audio.
fn copy_single(input: &Path, output: &Path) -> Result<PathBuf, MergeError> {
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(input, output)?;
    Ok(output.to_path_buf())
}
