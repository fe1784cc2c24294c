use episode_feed::github::GithubContents;

use crate::publisher::{EpisodeMeta, HostError, MediaHost};

/// Commits episodes into a GitHub repository and serves them from
/// `public_base_url`, by default the repository's raw content URL.
#[derive(Debug, Clone)]
pub struct GithubMediaHost {
    contents: GithubContents,
    public_base_url: String,
}

impl GithubMediaHost {
    pub fn new(contents: GithubContents) -> Self {
        let public_base_url = contents.repo().raw_base_url();
        Self {
            contents,
            public_base_url,
        }
    }

    /// Serve files from elsewhere, e.g. a GitHub Pages site
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url, path.trim_start_matches('/'))
    }
}

impl MediaHost for GithubMediaHost {
    #[tracing::instrument(skip(self, meta, bytes, _mime_type), fields(title = %meta.title, size = bytes.len()))]
    async fn upload(
        &self,
        meta: &EpisodeMeta,
        bytes: Vec<u8>,
        _mime_type: &str,
    ) -> Result<String, HostError> {
        // episode names are timestamped, so the file is always new
        let file_name = meta.file_name();
        self.contents
            .put_file(&file_name, &bytes, &format!("Add {}", meta.title), None)
            .await?;

        Ok(self.public_url(&file_name))
    }
}
