use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
    process::Command,
};

use crate::audio::{copy_single, ensure_inputs, AudioMerger, MergeError, SILENCE_GAP};

/// Merges with a single ffmpeg invocation.
///
/// Every input is resampled to one common format so inputs of differing
/// rates or layouts concatenate cleanly; the output container follows the
/// output file's extension.
#[derive(Debug, Clone)]
pub struct FfmpegMerger {
    binary: PathBuf,
    sample_rate: u32,
    channel_layout: &'static str,
}

impl FfmpegMerger {
    pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            sample_rate: Self::DEFAULT_SAMPLE_RATE,
            channel_layout: "stereo",
        }
    }

    /// Uses `binary` when given, otherwise looks `ffmpeg` up on `PATH`
    pub fn locate(binary: Option<PathBuf>) -> Result<Self, MergeError> {
        let binary = match binary {
            Some(path) => path,
            None => which::which("ffmpeg").map_err(|e| MergeError::FfmpegNotFound(e.to_string()))?,
        };
        Ok(Self::new(binary))
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// `filter_complex` graph for `count` inputs, ending in the `[out]` pad
    fn filter_graph(&self, count: usize) -> String {
        let rate = self.sample_rate;
        let layout = self.channel_layout;
        let gap = SILENCE_GAP.as_secs_f64();

        let mut graph = String::new();
        let mut pads = String::new();
        for i in 0..count {
            let _ = write!(
                graph,
                "[{i}:a]aresample={rate},aformat=sample_fmts=fltp:sample_rates={rate}:channel_layouts={layout}[a{i}];"
            );
            if i > 0 {
                let _ = write!(
                    graph,
                    "aevalsrc=0:c={layout}:s={rate}:d={gap:.3},aformat=sample_fmts=fltp[g{i}];"
                );
                let _ = write!(pads, "[g{i}]");
            }
            let _ = write!(pads, "[a{i}]");
        }

        let segments = count * 2 - 1;
        let _ = write!(graph, "{pads}concat=n={segments}:v=0:a=1[out]");
        graph
    }

    /// Decodes `input` to the null muxer, writing nothing
    fn decode_command(&self, input: &Path) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .args(["-hide_banner", "-loglevel", "error", "-i"])
            .arg(input)
            .args(["-f", "null", "-"]);
        command
    }

    fn run(&self, mut command: Command) -> Result<(), MergeError> {
        let result = command.output()?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            tracing::error!(status = %result.status, %stderr, "ffmpeg failed");
            return Err(MergeError::Ffmpeg {
                status: result.status.to_string(),
                stderr,
            });
        }
        Ok(())
    }

    fn command(&self, inputs: &[PathBuf], output: &Path) -> Command {
        let mut command = Command::new(&self.binary);
        command.args(["-hide_banner", "-loglevel", "error", "-y"]);
        for input in inputs {
            command.arg("-i").arg(input);
        }
        command
            .arg("-filter_complex")
            .arg(self.filter_graph(inputs.len()))
            .args(["-map", "[out]"])
            .arg(output);
        command
    }
}

impl AudioMerger for FfmpegMerger {
    #[tracing::instrument(skip(self, inputs), fields(count = inputs.len()))]
    fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<PathBuf, MergeError> {
        ensure_inputs(inputs)?;
        if let [single] = inputs {
            self.run(self.decode_command(single))?;
            return copy_single(single, output);
        }
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        self.run(self.command(inputs, output))?;

        tracing::info!(path = ?output, "Merged audio summaries");
        Ok(output.to_path_buf())
    }
}
