use std::fmt;

use itertools::Itertools;
use serde::Serialize;

use crate::{audio::MergeError, links::PaperLink, publisher::PublishError};

/// The externally observable steps of producing one audio summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Authenticate,
    AttachSource,
    Generate,
    Download,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Authenticate => "authenticate",
            Stage::AttachSource => "attach-source",
            Stage::Generate => "generate",
            Stage::Download => "download",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{stage} failed for {link}: {message}")]
pub struct AutomationError {
    pub stage: Stage,
    pub link: PaperLink,
    pub message: String,
}

impl AutomationError {
    pub fn new(stage: Stage, link: PaperLink, message: impl Into<String>) -> Self {
        Self {
            stage,
            link,
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(String),
    #[error("{}", describe_failures(.0))]
    Automation(Vec<AutomationError>),
    #[error("audio merge failed: {0}")]
    Merge(#[from] MergeError),
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
    #[error("failed to prepare working directory: {0}")]
    Workspace(#[source] std::io::Error),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn describe_failures(failures: &[AutomationError]) -> String {
    if failures.is_empty() {
        return "no audio summaries were produced".into();
    }
    failures.iter().map(ToString::to_string).join("; ")
}
