use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::feedstore::{FeedStore, FeedStoreError, StoredFeed};

/// Feed document kept in a file on the local disk
#[derive(Debug, Clone)]
pub struct LocalFeedStore {
    path: PathBuf,
}

impl LocalFeedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LocalFeedStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FeedStore for LocalFeedStore {
    async fn load(&self) -> Result<Option<StoredFeed>, FeedStoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(xml) => Ok(Some(StoredFeed {
                xml,
                revision: None,
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                tracing::error!(error = ?e, path = ?self.path, "Failed to read feed");
                Err(e.into())
            }
        }
    }

    async fn save(&self, xml: &str, _revision: Option<&str>) -> Result<(), FeedStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        // readers never observe a half-written feed
        let tmp_path = self.path.with_extension("xml.tmp");
        tokio::fs::write(&tmp_path, xml).await?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, path = ?self.path, "Failed to write feed"))?;

        tracing::debug!(path = ?self.path, "Feed written");
        Ok(())
    }
}
