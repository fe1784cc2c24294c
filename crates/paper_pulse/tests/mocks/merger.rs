use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use paper_pulse::{AudioMerger, MergeError};

/// Concatenates input bytes, recording the input file names of each call
#[derive(Clone, Default)]
pub struct MockAudioMerger {
    pub calls: Arc<Mutex<Vec<Vec<String>>>>,
    pub fail_with: Option<String>,
}

impl MockAudioMerger {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl AudioMerger for MockAudioMerger {
    fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<PathBuf, MergeError> {
        self.calls.lock().unwrap().push(
            inputs
                .iter()
                .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
                .collect(),
        );
        if let Some(ref msg) = self.fail_with {
            return Err(MergeError::Decode {
                path: inputs[0].clone(),
                message: msg.clone(),
            });
        }

        let mut merged = Vec::new();
        for input in inputs {
            merged.extend(std::fs::read(input)?);
        }
        std::fs::write(output, merged)?;
        Ok(output.to_path_buf())
    }
}
