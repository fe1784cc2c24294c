use crate::{
    feedstore::{FeedStore, FeedStoreError, StoredFeed},
    github::GithubContents,
};

/// Feed document committed to a GitHub repository, typically one served by
/// GitHub Pages. The blob sha is used as the revision for conditional writes.
#[derive(Debug, Clone)]
pub struct GithubFeedStore {
    contents: GithubContents,
    path: String,
}

impl GithubFeedStore {
    const COMMIT_MESSAGE: &str = "Update podcast feed";

    pub fn new(contents: GithubContents, path: impl Into<String>) -> Self {
        Self {
            contents,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl FeedStore for GithubFeedStore {
    async fn load(&self) -> Result<Option<StoredFeed>, FeedStoreError> {
        let Some(file) = self.contents.get_file(&self.path).await? else {
            return Ok(None);
        };

        Ok(Some(StoredFeed {
            xml: String::from_utf8(file.content)?,
            revision: Some(file.sha),
        }))
    }

    async fn save(&self, xml: &str, revision: Option<&str>) -> Result<(), FeedStoreError> {
        let sha = self
            .contents
            .put_file(&self.path, xml.as_bytes(), Self::COMMIT_MESSAGE, revision)
            .await?;

        tracing::info!(path = %self.path, %sha, "Feed committed");
        Ok(())
    }
}
