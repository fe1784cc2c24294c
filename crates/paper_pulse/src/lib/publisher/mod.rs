//! # Publishing
//!
//! An episode is published in two phases: the merged audio is uploaded to a
//! [`MediaHost`], then an item pointing at the uploaded file is appended to
//! the RSS feed kept in a [`FeedStore`]. A failed upload never touches the
//! feed.

pub mod github_host;
pub mod http_host;

use std::{
    future::Future,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use episode_feed::{
    ChannelInfo, FeedDocument, FeedDocumentError, FeedEntry, FeedStore, FeedStoreError,
    DEFAULT_MIME_TYPE,
};
use tokio::sync::Mutex;

pub use github_host::GithubMediaHost;
pub use http_host::HttpMediaHost;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upload rejected: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("upload response did not include a public URL")]
    MissingUrl,
    #[error(transparent)]
    Github(#[from] episode_feed::github::GithubError),
}

#[derive(Debug, thiserror::Error)]
pub enum FeedUpdateError {
    #[error(transparent)]
    Store(#[from] FeedStoreError),
    #[error(transparent)]
    Document(#[from] FeedDocumentError),
    #[error("feed kept changing underneath us, gave up after {0} attempts")]
    TooManyConflicts(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to read episode {}: {source}", path.display())]
    ReadEpisode {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("upload failed: {0}")]
    Upload(#[source] HostError),
    #[error("episode uploaded to {url} but the feed update failed: {source}")]
    Feed {
        url: String,
        #[source]
        source: FeedUpdateError,
    },
}

/// Stores episode media somewhere publicly reachable
pub trait MediaHost {
    /// Uploads `bytes` as [`EpisodeMeta::file_name`] and returns the public
    /// URL. Hosts that keep their own metadata also receive the title and
    /// description.
    fn upload(
        &self,
        meta: &EpisodeMeta,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> impl Future<Output = Result<String, HostError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeMeta {
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
}

impl EpisodeMeta {
    /// Metadata for a daily digest of `paper_count` papers
    pub fn for_papers(paper_count: usize, now: DateTime<Utc>) -> Self {
        Self {
            title: format!("AI Papers Summary - {}", now.format("%B %d, %Y")),
            description: format!("Summary of {paper_count} AI research papers from arXiv"),
            published_at: now,
        }
    }

    /// Name the media is uploaded under
    pub fn file_name(&self) -> String {
        self.published_at
            .format("episodes/episode-%Y%m%d-%H%M%S.mp3")
            .to_string()
    }
}

#[derive(Debug, Clone)]
pub struct PublishedEpisode {
    pub url: String,
    pub size: u64,
    /// Number of items in the feed after the update
    pub feed_items: usize,
}

pub struct Publisher<H, F> {
    host: H,
    feed_store: F,
    channel: ChannelInfo,
    feed_lock: Mutex<()>,
}

impl<H, F> Publisher<H, F>
where
    H: MediaHost + Send + Sync,
    F: FeedStore + Send + Sync,
{
    const MAX_FEED_ATTEMPTS: usize = 3;

    pub fn new(host: H, feed_store: F, channel: ChannelInfo) -> Self {
        Self {
            host,
            feed_store,
            channel,
            feed_lock: Mutex::new(()),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn feed_store(&self) -> &F {
        &self.feed_store
    }

    #[tracing::instrument(skip(self, meta), fields(title = %meta.title))]
    pub async fn publish(
        &self,
        episode_path: &Path,
        meta: EpisodeMeta,
    ) -> Result<PublishedEpisode, PublishError> {
        let bytes = tokio::fs::read(episode_path)
            .await
            .map_err(|source| PublishError::ReadEpisode {
                path: episode_path.to_path_buf(),
                source,
            })?;
        let size = bytes.len() as u64;

        let url = self
            .host
            .upload(&meta, bytes, DEFAULT_MIME_TYPE)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to upload episode"))
            .map_err(PublishError::Upload)?;
        tracing::info!(%url, size, "Episode uploaded");

        let entry = FeedEntry::new(meta.title, meta.description, url.clone(), meta.published_at)
            .with_length(size);
        let feed_items = match self.append_entry(entry).await {
            Ok(count) => count,
            Err(source) => {
                tracing::error!(error = %source, %url, "Failed to update feed");
                return Err(PublishError::Feed { url, source });
            }
        };

        Ok(PublishedEpisode {
            url,
            size,
            feed_items,
        })
    }

    /// Load, append, save. Retried when the store reports a concurrent
    /// modification. Returns the number of items in the saved feed.
    async fn append_entry(&self, entry: FeedEntry) -> Result<usize, FeedUpdateError> {
        let _guard = self.feed_lock.lock().await;

        for attempt in 1..=Self::MAX_FEED_ATTEMPTS {
            let (mut document, revision) = match self.feed_store.load().await? {
                Some(stored) => (FeedDocument::parse(&stored.xml)?, stored.revision),
                None => {
                    tracing::info!("No feed yet, starting a new one");
                    (FeedDocument::new(&self.channel), None)
                }
            };

            if document.contains_guid(entry.guid()) {
                tracing::info!(guid = entry.guid(), "Episode already in feed");
                return Ok(document.len());
            }

            document.append(entry.clone());
            let xml = document.to_xml()?;
            match self.feed_store.save(&xml, revision.as_deref()).await {
                Ok(()) => {
                    tracing::info!(items = document.len(), "Feed updated");
                    return Ok(document.len());
                }
                Err(FeedStoreError::Conflict) => {
                    tracing::warn!(attempt, "Feed changed while updating, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(FeedUpdateError::TooManyConflicts(Self::MAX_FEED_ATTEMPTS))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_episode_meta_for_papers() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 7, 5, 9).unwrap();
        let meta = EpisodeMeta::for_papers(2, now);

        assert_eq!(meta.title, "AI Papers Summary - October 18, 2026");
        assert_eq!(meta.description, "Summary of 2 AI research papers from arXiv");
        assert_eq!(meta.file_name(), "episodes/episode-20261018-070509.mp3");
    }
}
