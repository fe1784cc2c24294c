//! # Summary generation
//!
//! Spoken summaries are produced by remotely driving a browser against
//! NotebookLM. Callers only see [`SummaryGenerator`]; the browser automation
//! behind it can be replaced without touching the pipeline.

pub mod cdp;
mod generator;
mod session;

use std::{
    future::Future,
    path::{Path, PathBuf},
};

pub use generator::{GeneratorConfig, NotebookLmGenerator, SessionPolicy};
pub use session::{NotebookCredentials, NotebookSession, SessionError, SessionProvider};

use crate::{error::AutomationError, links::PaperLink};

/// One downloaded spoken summary
#[derive(Debug, Clone)]
pub struct AudioSummary {
    pub link: PaperLink,
    pub index: usize,
    pub path: PathBuf,
    pub size: u64,
}

/// Result of summarizing the link at `index` of the input sequence
#[derive(Debug)]
pub struct SummaryOutcome {
    pub link: PaperLink,
    pub index: usize,
    pub result: Result<AudioSummary, AutomationError>,
}

pub trait SummaryGenerator {
    /// Produces one outcome per link, in input order. Artifacts are written
    /// to `out_dir` and named by their position in `links`.
    fn produce_summaries(
        &self,
        links: &[PaperLink],
        out_dir: &Path,
    ) -> impl Future<Output = Vec<SummaryOutcome>> + Send;
}

pub fn summary_file_name(index: usize) -> String {
    format!("summary_{index}.mp3")
}
