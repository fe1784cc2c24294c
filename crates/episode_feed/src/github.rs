//! Minimal client for the GitHub repository contents API.
//!
//! Files are read and committed one at a time through
//! `GET/PUT /repos/{owner}/{repo}/contents/{path}`. Every write may carry the
//! blob `sha` it was based on, which makes it a conditional write: GitHub
//! rejects it when the file changed in the meantime.

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;

const USER_AGENT: &str = "paper-pulse";
const API_VERSION: &str = "2022-11-28";

#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("{path} was changed since it was last read")]
    Conflict { path: String },
    #[error("invalid repository '{0}', expected owner/name")]
    InvalidRepo(String),
    #[error("unsupported content encoding '{0}'")]
    UnsupportedEncoding(String),
    #[error("failed to decode file content: {0}")]
    Decode(#[from] base64::DecodeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubRepo {
    pub owner: String,
    pub name: String,
    pub branch: String,
}

impl GithubRepo {
    /// Parses an `owner/name` slug
    pub fn parse(slug: &str, branch: impl Into<String>) -> Result<Self, GithubError> {
        match slug.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(GithubRepo {
                    owner: owner.to_string(),
                    name: name.to_string(),
                    branch: branch.into(),
                })
            }
            _ => Err(GithubError::InvalidRepo(slug.to_string())),
        }
    }

    /// Base URL under which committed files are publicly served
    pub fn raw_base_url(&self) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}",
            self.owner, self.name, self.branch
        )
    }
}

/// A file as currently committed on the configured branch
#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub content: Vec<u8>,
    pub sha: String,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
    download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Clone)]
pub struct GithubContents {
    client: Client,
    api_base: String,
    repo: GithubRepo,
    token: String,
}

impl std::fmt::Debug for GithubContents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubContents")
            .field("api_base", &self.api_base)
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

impl GithubContents {
    const API_BASE: &str = "https://api.github.com";

    pub fn new(repo: GithubRepo, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: Self::API_BASE.into(),
            repo,
            token: token.into(),
        }
    }

    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    pub fn repo(&self) -> &GithubRepo {
        &self.repo
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base.trim_end_matches('/'),
            self.repo.owner,
            self.repo.name,
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Fetches `path` from the configured branch, `None` if it does not exist
    #[tracing::instrument(skip(self))]
    pub async fn get_file(&self, path: &str) -> Result<Option<RemoteFile>, GithubError> {
        let resp = self
            .request(reqwest::Method::GET, &self.contents_url(path))
            .query(&[("ref", self.repo.branch.as_str())])
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(GithubError::Api { status, message });
        }

        let body = resp.json::<ContentResponse>().await?;

        let content = match (body.encoding.as_str(), body.download_url) {
            ("base64", _) if !body.content.is_empty() => {
                // the API wraps base64 payloads at 60 columns
                let packed: String = body
                    .content
                    .chars()
                    .filter(|c| !c.is_ascii_whitespace())
                    .collect();
                STANDARD.decode(packed)?
            }
            // files above 1MB come back without inline content
            (_, Some(download_url)) => self
                .request(reqwest::Method::GET, &download_url)
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await?
                .to_vec(),
            (encoding, None) => return Err(GithubError::UnsupportedEncoding(encoding.into())),
        };

        Ok(Some(RemoteFile {
            content,
            sha: body.sha,
        }))
    }

    /// Commits `bytes` to `path`, returning the new blob sha.
    ///
    /// `sha` must be the blob the change is based on when the file already
    /// exists; a mismatch is reported as [`GithubError::Conflict`].
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn put_file(
        &self,
        path: &str,
        bytes: &[u8],
        message: &str,
        sha: Option<&str>,
    ) -> Result<String, GithubError> {
        let mut body = serde_json::json!({
            "message": message,
            "content": STANDARD.encode(bytes),
            "branch": self.repo.branch,
        });
        if let Some(sha) = sha {
            body["sha"] = serde_json::Value::String(sha.to_string());
        }

        let resp = self
            .request(reqwest::Method::PUT, &self.contents_url(path))
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<PutResponse>().await?.content.sha);
        }

        let message = resp.text().await.unwrap_or_default();
        if is_sha_conflict(status, &message) {
            tracing::warn!(path, "Conditional write rejected");
            return Err(GithubError::Conflict {
                path: path.to_string(),
            });
        }
        Err(GithubError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// 409 is a stale sha. 422 is only a conflict when it is about the sha,
/// e.g. the file appeared since it was read and no sha was sent; any other
/// 422 is a real validation failure.
fn is_sha_conflict(status: StatusCode, message: &str) -> bool {
    match status {
        StatusCode::CONFLICT => true,
        StatusCode::UNPROCESSABLE_ENTITY => message.contains("sha"),
        _ => false,
    }
}
