//! HTTP surface: the email webhook that triggers a pipeline run, a health
//! probe and the published feed.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use episode_feed::FeedStore;
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::{
    audio::AudioMerger,
    error::PipelineError,
    links::PaperLink,
    processor::{FailedLink, PipelineReport, PodcastPipeline},
    publisher::MediaHost,
    SummaryGenerator,
};

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_links: Option<Vec<PaperLink>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_files: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_links: Vec<FailedLink>,
}

impl From<PipelineReport> for WebhookResponse {
    fn from(report: PipelineReport) -> Self {
        if report.paper_links.is_empty() {
            return WebhookResponse {
                status: "success",
                message: "No paper links found".into(),
                paper_links: None,
                audio_files: None,
                episode_url: None,
                failed_links: Vec::new(),
            };
        }

        WebhookResponse {
            status: "success",
            message: format!("Generated {} audio summaries", report.audio_files.len()),
            paper_links: Some(report.paper_links),
            audio_files: Some(report.audio_files),
            episode_url: report.episode_url,
            failed_links: report.failed_links,
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            PipelineError::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to generate audio summaries: {other}"),
            ),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

pub fn router<G, M, H, F>(pipeline: Arc<PodcastPipeline<G, M, H, F>>) -> Router
where
    G: SummaryGenerator + Send + Sync + 'static,
    M: AudioMerger + Send + Sync + 'static,
    H: MediaHost + Send + Sync + 'static,
    F: FeedStore + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/webhook/email", post(process_email_webhook::<G, M, H, F>))
        .route("/feed.xml", get(feed_document::<G, M, H, F>))
        .layer(TraceLayer::new_for_http())
        .with_state(pipeline)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Pulls the plain text body out of an inbound email payload
fn email_body(payload: &[u8]) -> Result<String, PipelineError> {
    let payload = serde_json::from_slice::<Value>(payload)
        .ok()
        .filter(Value::is_object)
        .ok_or_else(|| PipelineError::Validation("Invalid JSON payload".into()))?;

    payload
        .get("body_plain")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PipelineError::Validation("Missing email body".into()))
}

#[tracing::instrument(skip_all)]
async fn process_email_webhook<G, M, H, F>(
    State(pipeline): State<Arc<PodcastPipeline<G, M, H, F>>>,
    body: Bytes,
) -> Result<Json<WebhookResponse>, PipelineError>
where
    G: SummaryGenerator + Send + Sync + 'static,
    M: AudioMerger + Send + Sync + 'static,
    H: MediaHost + Send + Sync + 'static,
    F: FeedStore + Send + Sync + 'static,
{
    let email_body = email_body(&body)
        .inspect_err(|e| tracing::warn!(error = %e, "Rejected webhook payload"))?;

    let report = pipeline
        .run(&email_body)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Pipeline run failed"))?;

    Ok(Json(report.into()))
}

async fn feed_document<G, M, H, F>(
    State(pipeline): State<Arc<PodcastPipeline<G, M, H, F>>>,
) -> Response
where
    G: SummaryGenerator + Send + Sync + 'static,
    M: AudioMerger + Send + Sync + 'static,
    H: MediaHost + Send + Sync + 'static,
    F: FeedStore + Send + Sync + 'static,
{
    match pipeline.publisher().feed_store().load().await {
        Ok(Some(feed)) => (
            [(header::CONTENT_TYPE, "application/rss+xml; charset=utf-8")],
            feed.xml,
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Feed not found" })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load feed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": format!("Failed to load feed: {e}") })),
            )
                .into_response()
        }
    }
}
