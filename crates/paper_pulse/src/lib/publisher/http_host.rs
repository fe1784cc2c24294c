use reqwest::Client;
use serde::Deserialize;

use crate::publisher::{EpisodeMeta, HostError, MediaHost};

/// Uploads episodes to a generic file host with a multipart `POST`.
///
/// The form carries the `file` along with the episode `title` and
/// `description`. The host is expected to answer with a JSON object carrying the public
/// `url` of the stored file.
#[derive(Clone)]
pub struct HttpMediaHost {
    client: Client,
    upload_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for HttpMediaHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMediaHost")
            .field("upload_url", &self.upload_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: Option<String>,
}

impl HttpMediaHost {
    pub fn new(upload_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            upload_url: upload_url.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

impl MediaHost for HttpMediaHost {
    #[tracing::instrument(skip(self, meta, bytes), fields(title = %meta.title, size = bytes.len()))]
    async fn upload(
        &self,
        meta: &EpisodeMeta,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<String, HostError> {
        // the host decides where the file lives, only the base name is sent
        let file_name = meta.file_name();
        let base_name = file_name.rsplit('/').next().unwrap_or(&file_name);
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(base_name.to_string())
            .mime_str(mime_type)?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("title", meta.title.clone())
            .text("description", meta.description.clone());

        let mut request = self.client.post(&self.upload_url).multipart(form);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(HostError::Api { status, message });
        }

        resp.json::<UploadResponse>()
            .await?
            .url
            .filter(|url| !url.is_empty())
            .ok_or(HostError::MissingUrl)
    }
}
