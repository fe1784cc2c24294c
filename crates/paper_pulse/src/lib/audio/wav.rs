use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::audio::{copy_single, ensure_inputs, AudioMerger, MergeError, SILENCE_GAP};

/// Pure Rust merger for PCM WAV inputs that share one format
#[derive(Debug, Clone, Copy, Default)]
pub struct WavMerger;

fn decode_err(path: &Path) -> impl FnOnce(hound::Error) -> MergeError + '_ {
    move |e| MergeError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn encode_err(path: &Path) -> impl FnOnce(hound::Error) -> MergeError + '_ {
    move |e| MergeError::Encode {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn silence_samples(spec: &WavSpec) -> u64 {
    let frames = u64::from(spec.sample_rate) * SILENCE_GAP.as_millis() as u64 / 1000;
    frames * u64::from(spec.channels)
}

/// Copies every sample of `input` into `writer`
fn append<W>(
    writer: &mut WavWriter<W>,
    input: &Path,
    output: &Path,
    spec: &WavSpec,
) -> Result<(), MergeError>
where
    W: std::io::Write + std::io::Seek,
{
    let mut reader = WavReader::open(input).map_err(decode_err(input))?;
    if reader.spec() != *spec {
        return Err(MergeError::FormatMismatch {
            path: input.to_path_buf(),
        });
    }

    match spec.sample_format {
        SampleFormat::Int => {
            for sample in reader.samples::<i32>() {
                let sample = sample.map_err(decode_err(input))?;
                writer.write_sample(sample).map_err(encode_err(output))?;
            }
        }
        SampleFormat::Float => {
            for sample in reader.samples::<f32>() {
                let sample = sample.map_err(decode_err(input))?;
                writer.write_sample(sample).map_err(encode_err(output))?;
            }
        }
    }
    Ok(())
}

/// Reads every sample of `input` without keeping any of them
fn decode_all(input: &Path) -> Result<(), MergeError> {
    let mut reader = WavReader::open(input).map_err(decode_err(input))?;
    match reader.spec().sample_format {
        SampleFormat::Int => {
            for sample in reader.samples::<i32>() {
                sample.map_err(decode_err(input))?;
            }
        }
        SampleFormat::Float => {
            for sample in reader.samples::<f32>() {
                sample.map_err(decode_err(input))?;
            }
        }
    }
    Ok(())
}

impl AudioMerger for WavMerger {
    #[tracing::instrument(skip(self, inputs), fields(count = inputs.len()))]
    fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<PathBuf, MergeError> {
        ensure_inputs(inputs)?;
        if let [single] = inputs {
            decode_all(single)?;
            return copy_single(single, output);
        }

        let spec = WavReader::open(&inputs[0])
            .map_err(decode_err(&inputs[0]))?
            .spec();
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = WavWriter::create(output, spec).map_err(encode_err(output))?;
        for (i, input) in inputs.iter().enumerate() {
            if i > 0 {
                for _ in 0..silence_samples(&spec) {
                    match spec.sample_format {
                        SampleFormat::Int => writer.write_sample(0i32),
                        SampleFormat::Float => writer.write_sample(0f32),
                    }
                    .map_err(encode_err(output))?;
                }
            }
            append(&mut writer, input, output, &spec)?;
        }
        writer.finalize().map_err(encode_err(output))?;

        tracing::info!(path = ?output, "Merged audio summaries");
        Ok(output.to_path_buf())
    }
}
