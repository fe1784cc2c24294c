use std::sync::{Arc, Mutex};

use paper_pulse::{publisher::HostError, EpisodeMeta, MediaHost};

#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub title: String,
    pub description: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Clone, Default)]
pub struct MockMediaHost {
    pub uploads: Arc<Mutex<Vec<Upload>>>,
    pub fail_with: Option<String>,
}

impl MockMediaHost {
    pub const BASE_URL: &'static str = "https://media.example.com";

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl MediaHost for MockMediaHost {
    async fn upload(
        &self,
        meta: &EpisodeMeta,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<String, HostError> {
        if let Some(ref msg) = self.fail_with {
            return Err(HostError::Api {
                status: 503,
                message: msg.clone(),
            });
        }
        let file_name = meta.file_name();
        self.uploads.lock().unwrap().push(Upload {
            file_name: file_name.clone(),
            title: meta.title.clone(),
            description: meta.description.clone(),
            bytes,
            mime_type: mime_type.to_string(),
        });
        Ok(format!("{}/{file_name}", Self::BASE_URL))
    }
}
