use std::{path::Path, time::Duration};

use futures::{stream, StreamExt};

use crate::{
    error::{AutomationError, Stage},
    links::PaperLink,
    notebook::{
        summary_file_name, AudioSummary, NotebookCredentials, NotebookSession, SessionError,
        SessionProvider, SummaryGenerator, SummaryOutcome,
    },
};

/// How remote browser sessions are spent on a batch of links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPolicy {
    /// A fresh session per link, at most `max_parallel` at a time. Pays for a
    /// login per link.
    PerLink { max_parallel: usize },
    /// One session, authenticated once, links processed one after another
    Shared,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        SessionPolicy::PerLink { max_parallel: 3 }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub credentials: NotebookCredentials,
    /// NotebookLM exposes no completion signal, so generation is given a
    /// fixed amount of time. Too short yields an empty or truncated download.
    pub generation_wait: Duration,
    pub session_policy: SessionPolicy,
}

impl GeneratorConfig {
    pub const DEFAULT_GENERATION_WAIT: Duration = Duration::from_secs(300);

    pub fn new(credentials: NotebookCredentials) -> Self {
        Self {
            credentials,
            generation_wait: Self::DEFAULT_GENERATION_WAIT,
            session_policy: SessionPolicy::default(),
        }
    }

    pub fn with_generation_wait(mut self, wait: Duration) -> Self {
        self.generation_wait = wait;
        self
    }

    pub fn with_session_policy(mut self, policy: SessionPolicy) -> Self {
        self.session_policy = policy;
        self
    }
}

/// Produces audio overviews by walking NotebookLM through
/// `Idle → Authenticated → SourceAttached → Generating → Downloaded`.
/// A failed step ends the link's run; nothing is retried.
#[derive(Debug)]
pub struct NotebookLmGenerator<P> {
    provider: P,
    config: GeneratorConfig,
}

fn at_stage(stage: Stage, link: &PaperLink) -> impl FnOnce(SessionError) -> AutomationError + '_ {
    move |err| AutomationError::new(stage, link.clone(), err.to_string())
}

impl<P> NotebookLmGenerator<P>
where
    P: SessionProvider + Send + Sync,
{
    pub fn new(provider: P, config: GeneratorConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Summarizes a single link in a session of its own
    #[tracing::instrument(skip(self, link, out_dir), fields(link = %link))]
    pub async fn produce_summary(
        &self,
        link: &PaperLink,
        index: usize,
        out_dir: &Path,
    ) -> Result<AudioSummary, AutomationError> {
        let mut session = self
            .provider
            .open()
            .await
            .map_err(at_stage(Stage::Authenticate, link))?;

        let result = match session.authenticate(&self.config.credentials).await {
            Ok(()) => self.run_stages(&mut session, link, index, out_dir).await,
            Err(e) => Err(at_stage(Stage::Authenticate, link)(e)),
        };
        session.close().await;

        result.inspect_err(|e| tracing::error!(error = %e, "Summary generation failed"))
    }

    /// Drives an authenticated session from a fresh notebook to a downloaded
    /// audio file
    async fn run_stages<S: NotebookSession>(
        &self,
        session: &mut S,
        link: &PaperLink,
        index: usize,
        out_dir: &Path,
    ) -> Result<AudioSummary, AutomationError> {
        session
            .create_notebook()
            .await
            .map_err(at_stage(Stage::AttachSource, link))?;
        session
            .attach_source(link)
            .await
            .map_err(at_stage(Stage::AttachSource, link))?;
        tracing::debug!(%link, "Source attached");

        session
            .start_generation()
            .await
            .map_err(at_stage(Stage::Generate, link))?;
        tracing::info!(%link, wait = ?self.config.generation_wait, "Waiting for audio generation");
        tokio::time::sleep(self.config.generation_wait).await;

        let audio = session
            .download_audio()
            .await
            .map_err(at_stage(Stage::Download, link))?;
        if audio.is_empty() {
            return Err(at_stage(Stage::Download, link)(SessionError::EmptyDownload));
        }

        let path = out_dir.join(summary_file_name(index));
        tokio::fs::write(&path, &audio).await.map_err(|e| {
            AutomationError::new(
                Stage::Download,
                link.clone(),
                format!("failed to write {}: {e}", path.display()),
            )
        })?;
        tracing::info!(%link, path = ?path, size = audio.len(), "Audio summary downloaded");

        Ok(AudioSummary {
            link: link.clone(),
            index,
            path,
            size: audio.len() as u64,
        })
    }

    async fn fan_out(
        &self,
        links: &[PaperLink],
        out_dir: &Path,
        max_parallel: usize,
    ) -> Vec<SummaryOutcome> {
        let tasks = links
            .iter()
            .enumerate()
            .map(move |(index, link)| async move {
                let result = self.produce_summary(link, index, out_dir).await;
                SummaryOutcome {
                    link: link.clone(),
                    index,
                    result,
                }
            })
            .collect::<Vec<_>>();

        let mut outcomes = stream::iter(tasks)
            .buffer_unordered(max_parallel.max(1))
            .collect::<Vec<_>>()
            .await;
        outcomes.sort_by_key(|outcome| outcome.index);
        outcomes
    }

    async fn in_shared_session(&self, links: &[PaperLink], out_dir: &Path) -> Vec<SummaryOutcome> {
        let login = match self.provider.open().await {
            Ok(mut session) => match session.authenticate(&self.config.credentials).await {
                Ok(()) => Ok(session),
                Err(e) => {
                    session.close().await;
                    Err(e)
                }
            },
            Err(e) => Err(e),
        };

        let mut session = match login {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(error = %e, "Failed to authenticate shared session");
                let message = e.to_string();
                return links
                    .iter()
                    .enumerate()
                    .map(|(index, link)| SummaryOutcome {
                        link: link.clone(),
                        index,
                        result: Err(AutomationError::new(
                            Stage::Authenticate,
                            link.clone(),
                            message.clone(),
                        )),
                    })
                    .collect();
            }
        };

        let mut outcomes = Vec::with_capacity(links.len());
        for (index, link) in links.iter().enumerate() {
            let result = self
                .run_stages(&mut session, link, index, out_dir)
                .await
                .inspect_err(|e| tracing::error!(error = %e, "Summary generation failed"));
            outcomes.push(SummaryOutcome {
                link: link.clone(),
                index,
                result,
            });
        }
        session.close().await;

        outcomes
    }
}

impl<P> SummaryGenerator for NotebookLmGenerator<P>
where
    P: SessionProvider + Send + Sync,
{
    async fn produce_summaries(&self, links: &[PaperLink], out_dir: &Path) -> Vec<SummaryOutcome> {
        tracing::info!(count = links.len(), policy = ?self.config.session_policy, "Generating audio summaries");
        match self.config.session_policy {
            SessionPolicy::PerLink { max_parallel } => {
                self.fan_out(links, out_dir, max_parallel).await
            }
            SessionPolicy::Shared => self.in_shared_session(links, out_dir).await,
        }
    }
}
