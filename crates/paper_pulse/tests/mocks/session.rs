use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use paper_pulse::{
    notebook::{NotebookCredentials, NotebookSession, SessionError, SessionProvider},
    PaperLink,
};

/// Records every UI step as e.g. `"open"`, `"attach_source:<url>"`
#[derive(Clone)]
pub struct MockSessionProvider {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub audio: Vec<u8>,
    /// Step name that fails for every link
    pub fail_step: Option<&'static str>,
    pub fail_with: String,
    /// Only this link fails, at `attach_source`
    pub failing_link: Option<String>,
    pub step_delay: Duration,
    pub active: Arc<AtomicUsize>,
    pub peak: Arc<AtomicUsize>,
}

impl Default for MockSessionProvider {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            audio: b"ID3-mock-audio".to_vec(),
            fail_step: None,
            fail_with: String::new(),
            failing_link: None,
            step_delay: Duration::ZERO,
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl MockSessionProvider {
    pub fn failing_at(step: &'static str, msg: &str) -> Self {
        Self {
            fail_step: Some(step),
            fail_with: msg.to_string(),
            ..Default::default()
        }
    }

    pub fn failing_link(url: &str) -> Self {
        Self {
            failing_link: Some(url.to_string()),
            fail_with: "source rejected".to_string(),
            ..Default::default()
        }
    }

    pub fn with_audio(mut self, audio: &[u8]) -> Self {
        self.audio = audio.to_vec();
        self
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn count(&self, step: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.split(':').next() == Some(step))
            .count()
    }
}

pub struct MockSession {
    provider: MockSessionProvider,
}

impl MockSession {
    fn step(&self, name: &str) -> Result<(), SessionError> {
        self.provider.calls.lock().unwrap().push(name.to_string());
        if self.provider.fail_step == Some(name) {
            return Err(SessionError::Browser(self.provider.fail_with.clone()));
        }
        Ok(())
    }
}

impl SessionProvider for MockSessionProvider {
    type Session = MockSession;

    async fn open(&self) -> Result<MockSession, SessionError> {
        self.calls.lock().unwrap().push("open".to_string());
        if self.fail_step == Some("open") {
            return Err(SessionError::Connect(self.fail_with.clone()));
        }

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);
        Ok(MockSession {
            provider: self.clone(),
        })
    }
}

impl NotebookSession for MockSession {
    async fn authenticate(&mut self, credentials: &NotebookCredentials) -> Result<(), SessionError> {
        assert_eq!(credentials.email, "reader@example.com");
        self.step("authenticate")
    }

    async fn create_notebook(&mut self) -> Result<(), SessionError> {
        self.step("create_notebook")
    }

    async fn attach_source(&mut self, link: &PaperLink) -> Result<(), SessionError> {
        self.provider
            .calls
            .lock()
            .unwrap()
            .push(format!("attach_source:{link}"));
        if self.provider.fail_step == Some("attach_source")
            || self.provider.failing_link.as_deref() == Some(link.as_str())
        {
            return Err(SessionError::Browser(self.provider.fail_with.clone()));
        }
        Ok(())
    }

    async fn start_generation(&mut self) -> Result<(), SessionError> {
        tokio::time::sleep(self.provider.step_delay).await;
        self.step("start_generation")
    }

    async fn download_audio(&mut self) -> Result<Vec<u8>, SessionError> {
        self.step("download_audio")?;
        Ok(self.provider.audio.clone())
    }

    async fn close(self) {
        self.provider.calls.lock().unwrap().push("close".to_string());
        self.provider.active.fetch_sub(1, Ordering::SeqCst);
    }
}
