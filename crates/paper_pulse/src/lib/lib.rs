pub mod audio;
mod error;
pub mod links;
pub mod notebook;
mod processor;
pub mod publisher;
pub mod server;
pub mod tracing;

pub use audio::{AudioMerger, MergeError};
pub use error::{AutomationError, PipelineError, Stage};
pub use links::{extract_paper_links, PaperLink};
pub use notebook::{AudioSummary, SummaryGenerator, SummaryOutcome};
pub use processor::{
    builder::PodcastPipelineBuilder, FailedLink, FailurePolicy, PipelineReport, PodcastPipeline,
};
pub use publisher::{EpisodeMeta, MediaHost, PublishError, Publisher};
