pub mod builder;

use std::{
    fs::remove_dir_all,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Utc;
use episode_feed::FeedStore;
use itertools::Itertools;
use serde::Serialize;

use crate::{
    audio::AudioMerger,
    error::{AutomationError, PipelineError, Stage},
    links::{extract_paper_links, PaperLink},
    notebook::{AudioSummary, SummaryGenerator},
    publisher::{EpisodeMeta, MediaHost, Publisher},
};

/// What to do when some links fail and others succeed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Any failed link fails the run
    #[default]
    FailFast,
    /// Publish what succeeded and report the rest; fails only when nothing
    /// succeeded
    BestEffort,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedLink {
    pub link: PaperLink,
    pub stage: Stage,
    pub error: String,
}

impl From<AutomationError> for FailedLink {
    fn from(err: AutomationError) -> Self {
        FailedLink {
            link: err.link,
            stage: err.stage,
            error: err.message,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub paper_links: Vec<PaperLink>,
    /// File names of the audio summaries that made it into the episode
    pub audio_files: Vec<String>,
    pub failed_links: Vec<FailedLink>,
    pub episode_url: Option<String>,
}

/// Per-run scratch directory, removed with everything in it once the run
/// is over
struct RunDirectory {
    path: Option<PathBuf>,
}

impl RunDirectory {
    fn create(workdir: &Path) -> std::io::Result<Self> {
        let path = workdir.join(uuid::Uuid::new_v4().to_string());
        std::fs::create_dir_all(&path)?;
        Ok(RunDirectory { path: Some(path) })
    }

    fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or(Path::new(""))
    }

    /// Removes the directory on the blocking pool
    async fn remove(mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => tracing::debug!(?path, "Cleaned up run directory"),
            Err(e) => tracing::warn!(error = ?e, ?path, "Failed to clean up run directory"),
        }
    }
}

// Only reached when a run is cancelled before `remove`
impl Drop for RunDirectory {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = remove_dir_all(&path) {
                tracing::warn!(error = ?e, ?path, "Failed to clean up run directory");
            }
        }
    }
}

/// Email text in, published podcast episode out
pub struct PodcastPipeline<G, M, H, F>
where
    G: SummaryGenerator + Send + Sync + 'static,
    M: AudioMerger + Send + Sync + 'static,
    H: MediaHost + Send + Sync + 'static,
    F: FeedStore + Send + Sync + 'static,
{
    workdir: PathBuf,
    generator: G,
    merger: Arc<M>,
    publisher: Publisher<H, F>,
    failure_policy: FailurePolicy,
}

impl<G, M, H, F> PodcastPipeline<G, M, H, F>
where
    G: SummaryGenerator + Send + Sync + 'static,
    M: AudioMerger + Send + Sync + 'static,
    H: MediaHost + Send + Sync + 'static,
    F: FeedStore + Send + Sync + 'static,
{
    pub const MERGED_EPISODE_NAME: &str = "final_podcast.mp3";

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn publisher(&self) -> &Publisher<H, F> {
        &self.publisher
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Produces one summary per link and applies the failure policy.
    /// Returns the successful summaries in link order plus the failures.
    #[tracing::instrument(skip_all, fields(count = links.len()))]
    async fn generate(
        &self,
        links: &[PaperLink],
        out_dir: &Path,
    ) -> Result<(Vec<AudioSummary>, Vec<AutomationError>), PipelineError> {
        let (summaries, failures): (Vec<_>, Vec<_>) = self
            .generator
            .produce_summaries(links, out_dir)
            .await
            .into_iter()
            .map(|outcome| outcome.result)
            .partition_result();

        tracing::info!(
            succeeded = summaries.len(),
            failed = failures.len(),
            "Summary generation finished"
        );

        let abort = match self.failure_policy {
            FailurePolicy::FailFast => !failures.is_empty(),
            FailurePolicy::BestEffort => summaries.is_empty(),
        };
        if abort || summaries.is_empty() {
            return Err(PipelineError::Automation(failures));
        }

        Ok((summaries, failures))
    }

    #[tracing::instrument(skip_all, fields(count = summaries.len()))]
    async fn merge(
        &self,
        summaries: &[AudioSummary],
        out_dir: &Path,
    ) -> Result<PathBuf, PipelineError> {
        let merger = Arc::clone(&self.merger);
        let inputs = summaries
            .iter()
            .map(|summary| summary.path.clone())
            .collect::<Vec<_>>();
        let output = out_dir.join(Self::MERGED_EPISODE_NAME);

        let merged = tokio::task::spawn_blocking(move || merger.merge(&inputs, &output))
            .await?
            .inspect_err(|e| tracing::error!(error = %e, "Failed to merge audio"))?;

        Ok(merged)
    }

    /// Runs the whole workflow for one email body
    #[tracing::instrument(skip_all)]
    pub async fn run(&self, email_body: &str) -> Result<PipelineReport, PipelineError> {
        let links = extract_paper_links(email_body);
        tracing::info!(count = links.len(), "Extracted paper links");
        if links.is_empty() {
            return Ok(PipelineReport::default());
        }

        let run_dir = RunDirectory::create(&self.workdir).map_err(PipelineError::Workspace)?;
        let result = self.produce(links, run_dir.path()).await;
        run_dir.remove().await;
        result
    }

    /// Generate, merge and publish inside `run_dir`
    async fn produce(
        &self,
        links: Vec<PaperLink>,
        run_dir: &Path,
    ) -> Result<PipelineReport, PipelineError> {
        let (summaries, failures) = self.generate(&links, run_dir).await?;
        let merged = self.merge(&summaries, run_dir).await?;

        let meta = EpisodeMeta::for_papers(summaries.len(), Utc::now());
        let episode = self.publisher.publish(&merged, meta).await?;
        tracing::info!(url = %episode.url, "Episode published");

        let audio_files = summaries
            .iter()
            .filter_map(|summary| summary.path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();

        Ok(PipelineReport {
            paper_links: links,
            audio_files,
            failed_links: failures.into_iter().map(FailedLink::from).collect(),
            episode_url: Some(episode.url),
        })
    }
}
