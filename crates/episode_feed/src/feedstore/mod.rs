use std::{future::Future, string::FromUtf8Error};

use crate::github::GithubError;

pub mod github;
pub mod local;

/// A feed document as read from storage.
///
/// `revision` identifies the stored version for stores that support
/// conditional writes; it is passed back unchanged to [`FeedStore::save`].
#[derive(Debug, Clone)]
pub struct StoredFeed {
    pub xml: String,
    pub revision: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum FeedStoreError {
    #[error("feed storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored feed is not valid UTF-8: {0}")]
    Encoding(#[from] FromUtf8Error),
    #[error("feed storage error: {0}")]
    Github(#[source] GithubError),
    #[error("feed was modified concurrently")]
    Conflict,
}

impl From<GithubError> for FeedStoreError {
    fn from(err: GithubError) -> Self {
        match err {
            GithubError::Conflict { .. } => FeedStoreError::Conflict,
            other => FeedStoreError::Github(other),
        }
    }
}

pub trait FeedStore {
    /// Reads the current feed document, `None` if no feed has been stored yet
    fn load(&self) -> impl Future<Output = Result<Option<StoredFeed>, FeedStoreError>> + Send;

    /// Persists `xml`, conditioned on `revision` where the store supports it
    fn save(
        &self,
        xml: &str,
        revision: Option<&str>,
    ) -> impl Future<Output = Result<(), FeedStoreError>> + Send;
}

impl<T: FeedStore + Send + Sync> FeedStore for &T {
    async fn load(&self) -> Result<Option<StoredFeed>, FeedStoreError> {
        (**self).load().await
    }

    async fn save(&self, xml: &str, revision: Option<&str>) -> Result<(), FeedStoreError> {
        (**self).save(xml, revision).await
    }
}
