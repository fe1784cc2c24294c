//! NotebookLM automation over the Chrome DevTools Protocol.
//!
//! Sessions are remote Chromium instances hosted by Browserbase. UI controls
//! are located by CSS selector, optionally narrowed by their visible text,
//! and every step polls for its control until `step_timeout` expires. The
//! selectors mirror NotebookLM's current markup and break whenever it
//! changes.

use std::{
    fmt,
    time::{Duration, Instant},
};

use base64::{engine::general_purpose::STANDARD, Engine};
use chromiumoxide::{
    cdp::js_protocol::runtime::EvaluateParams, error::CdpError, Browser, Page,
};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::{
    links::PaperLink,
    notebook::{NotebookCredentials, NotebookSession, SessionError, SessionProvider},
};

const NOTEBOOK_URL: &str = "https://notebooklm.google.com/";

/// A UI control: elements matching `css` whose text contains `text`
#[derive(Debug, Clone, Copy)]
struct Control {
    css: &'static str,
    text: Option<&'static str>,
}

impl Control {
    const fn css(css: &'static str) -> Self {
        Control { css, text: None }
    }

    const fn with_text(css: &'static str, text: &'static str) -> Self {
        Control {
            css,
            text: Some(text),
        }
    }

    /// JS expression evaluating to the first matching element or `undefined`
    fn locate_js(&self) -> String {
        let css = Value::from(self.css).to_string();
        let text = Value::from(self.text.unwrap_or_default()).to_string();
        format!(
            "Array.from(document.querySelectorAll({css}))\
             .find((el) => !{text} || (el.textContent || '').includes({text}))"
        )
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text {
            Some(text) => write!(f, "{} containing \"{}\"", self.css, text),
            None => f.write_str(self.css),
        }
    }
}

const EMAIL_INPUT: Control = Control::css("#identifierId");
const PASSWORD_INPUT: Control = Control::css(r#"input[type="password"]"#);
const NEXT_BUTTON: Control = Control::with_text("button", "Next");
const NEW_NOTEBOOK_BUTTON: Control = Control::with_text("project-button", "New Notebook");
const WEBSITE_SOURCE_CHIP: Control = Control::with_text("mat-chip", "Website");
const SOURCE_URL_INPUT: Control = Control::css(r#"input[formcontrolname="newUrl"]"#);
const INSERT_BUTTON: Control = Control::with_text("button", "Insert");
const GENERATE_BUTTON: Control = Control::with_text("button", "Generate");
const AUDIO_MENU_ICON: Control = Control::with_text("button mat-icon", "more_vert");
const DOWNLOAD_ICON: Control = Control::with_text("a mat-icon", "download");

fn browser_err(err: CdpError) -> SessionError {
    SessionError::Browser(err.to_string())
}

/// Opens Browserbase sessions by connecting to its CDP endpoint
#[derive(Clone)]
pub struct BrowserbaseProvider {
    connect_url: String,
    api_key: String,
    step_timeout: Duration,
    poll_interval: Duration,
}

impl fmt::Debug for BrowserbaseProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserbaseProvider")
            .field("connect_url", &self.connect_url)
            .field("step_timeout", &self.step_timeout)
            .finish_non_exhaustive()
    }
}

impl BrowserbaseProvider {
    pub const DEFAULT_CONNECT_URL: &str = "wss://connect.browserbase.com";
    pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            connect_url: Self::DEFAULT_CONNECT_URL.into(),
            api_key: api_key.into(),
            step_timeout: Self::DEFAULT_STEP_TIMEOUT,
            poll_interval: Duration::from_millis(500),
        }
    }

    pub fn with_connect_url(mut self, url: impl Into<String>) -> Self {
        self.connect_url = url.into();
        self
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}?apiKey={}", self.connect_url, self.api_key)
    }

    /// Strips the API key from messages that may echo the endpoint
    fn redact(&self, message: String) -> String {
        if self.api_key.is_empty() {
            return message;
        }
        message.replace(&self.api_key, "[redacted]")
    }
}

impl SessionProvider for BrowserbaseProvider {
    type Session = CdpSession;

    async fn open(&self) -> Result<CdpSession, SessionError> {
        let (mut browser, mut handler) = Browser::connect(self.endpoint())
            .await
            .map_err(|e| SessionError::Connect(self.redact(e.to_string())))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "CDP connection closed");
                    break;
                }
            }
        });

        // Browserbase sessions come with a default context and page
        let existing = browser.pages().await.ok().and_then(|pages| pages.into_iter().next());
        let page = match existing {
            Some(page) => page,
            None => match browser.new_page("about:blank").await {
                Ok(page) => page,
                Err(e) => {
                    let _ = browser.close().await;
                    handler_task.abort();
                    return Err(SessionError::Connect(self.redact(e.to_string())));
                }
            },
        };

        tracing::debug!("Remote browser session opened");
        Ok(CdpSession {
            browser,
            page,
            handler_task,
            step_timeout: self.step_timeout,
            poll_interval: self.poll_interval,
        })
    }
}

pub struct CdpSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    step_timeout: Duration,
    poll_interval: Duration,
}

impl CdpSession {
    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T, SessionError> {
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(SessionError::Browser)?;

        self.page
            .evaluate_expression(params)
            .await
            .map_err(browser_err)?
            .into_value::<T>()
            .map_err(|e| SessionError::Browser(e.to_string()))
    }

    async fn is_present(&self, control: Control) -> Result<bool, SessionError> {
        self.eval(format!("!!({})", control.locate_js())).await
    }

    async fn wait_for(&self, control: Control) -> Result<(), SessionError> {
        let deadline = Instant::now() + self.step_timeout;
        loop {
            if self.is_present(control).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SessionError::ControlNotFound {
                    control: control.to_string(),
                    timeout: self.step_timeout,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn click(&self, control: Control) -> Result<(), SessionError> {
        self.wait_for(control).await?;

        // icons and labels sit inside the element that owns the click handler
        let script = format!(
            "(() => {{ const el = {}; if (!el) return false; \
             (el.closest('button, a') || el).click(); return true; }})()",
            control.locate_js()
        );
        if self.eval::<bool>(script).await? {
            Ok(())
        } else {
            Err(SessionError::ControlNotFound {
                control: control.to_string(),
                timeout: self.step_timeout,
            })
        }
    }

    async fn fill(&self, control: Control, value: &str) -> Result<(), SessionError> {
        self.wait_for(control).await?;

        let element = self.page.find_element(control.css).await.map_err(browser_err)?;
        element.click().await.map_err(browser_err)?;
        element.type_str(value).await.map_err(browser_err)?;
        Ok(())
    }

    /// Fetches the audio behind the download link from inside the page, so
    /// the request carries the session's cookies. Returns base64.
    async fn fetch_download(&self) -> Result<String, SessionError> {
        let script = format!(
            "(async () => {{ \
               const icon = {}; \
               const anchor = icon && icon.closest('a'); \
               if (!anchor || !anchor.href) return ''; \
               const response = await fetch(anchor.href, {{ credentials: 'include' }}); \
               if (!response.ok) return ''; \
               const bytes = new Uint8Array(await response.arrayBuffer()); \
               let binary = ''; \
               for (let i = 0; i < bytes.length; i += 0x8000) {{ \
                 binary += String.fromCharCode.apply(null, bytes.subarray(i, i + 0x8000)); \
               }} \
               return btoa(binary); \
             }})()",
            DOWNLOAD_ICON.locate_js()
        );
        self.eval(script).await
    }
}

impl NotebookSession for CdpSession {
    async fn authenticate(&mut self, credentials: &NotebookCredentials) -> Result<(), SessionError> {
        self.page.goto(NOTEBOOK_URL).await.map_err(browser_err)?;

        self.fill(EMAIL_INPUT, &credentials.email).await?;
        self.click(NEXT_BUTTON).await?;
        self.fill(PASSWORD_INPUT, credentials.password()).await?;
        self.click(NEXT_BUTTON).await?;

        // the notebook list only renders for a signed-in account
        self.wait_for(NEW_NOTEBOOK_BUTTON).await
    }

    async fn create_notebook(&mut self) -> Result<(), SessionError> {
        self.page.goto(NOTEBOOK_URL).await.map_err(browser_err)?;
        self.click(NEW_NOTEBOOK_BUTTON).await
    }

    async fn attach_source(&mut self, link: &PaperLink) -> Result<(), SessionError> {
        self.click(WEBSITE_SOURCE_CHIP).await?;
        self.fill(SOURCE_URL_INPUT, link.as_str()).await?;
        self.click(INSERT_BUTTON).await
    }

    async fn start_generation(&mut self) -> Result<(), SessionError> {
        self.click(GENERATE_BUTTON).await
    }

    async fn download_audio(&mut self) -> Result<Vec<u8>, SessionError> {
        self.click(AUDIO_MENU_ICON).await?;
        self.wait_for(DOWNLOAD_ICON).await?;

        let encoded = self.fetch_download().await?;
        if encoded.is_empty() {
            return Err(SessionError::EmptyDownload);
        }
        STANDARD
            .decode(encoded)
            .map_err(|e| SessionError::Browser(format!("invalid download payload: {e}")))
    }

    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::debug!(error = %e, "Failed to close remote browser");
        }
        self.handler_task.abort();
    }
}
