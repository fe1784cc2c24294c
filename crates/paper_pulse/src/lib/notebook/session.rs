use std::{fmt, future::Future, time::Duration};

use crate::links::PaperLink;

#[derive(Clone)]
pub struct NotebookCredentials {
    pub email: String,
    password: String,
}

impl NotebookCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for NotebookCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotebookCredentials")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to connect to remote browser: {0}")]
    Connect(String),
    #[error("timed out after {timeout:?} waiting for {control}")]
    ControlNotFound { control: String, timeout: Duration },
    #[error("browser error: {0}")]
    Browser(String),
    #[error("download produced no audio")]
    EmptyDownload,
}

/// One authenticated browser context driving the notebook application.
///
/// Each method is one UI step; implementations wait for the controls they
/// need and fail with [`SessionError`] when a control never shows up.
pub trait NotebookSession: Send {
    fn authenticate(
        &mut self,
        credentials: &NotebookCredentials,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    fn create_notebook(&mut self) -> impl Future<Output = Result<(), SessionError>> + Send;

    fn attach_source(
        &mut self,
        link: &PaperLink,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    fn start_generation(&mut self) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Returns the raw bytes of the generated audio
    fn download_audio(&mut self) -> impl Future<Output = Result<Vec<u8>, SessionError>> + Send;

    fn close(self) -> impl Future<Output = ()> + Send;
}

pub trait SessionProvider {
    type Session: NotebookSession;

    /// Opens a fresh, unauthenticated remote browser session
    fn open(&self) -> impl Future<Output = Result<Self::Session, SessionError>> + Send;
}
