use std::{path::PathBuf, sync::Arc};

use episode_feed::{ChannelInfo, FeedStore};

use crate::{
    audio::AudioMerger,
    processor::{FailurePolicy, PodcastPipeline},
    publisher::{MediaHost, Publisher},
    SummaryGenerator,
};

pub struct PodcastPipelineBuilder<G = (), M = (), H = (), F = ()> {
    workdir: PathBuf,
    generator: G,
    merger: M,
    media_host: H,
    feed_store: F,
    channel: ChannelInfo,
    failure_policy: FailurePolicy,
}

impl PodcastPipelineBuilder {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            generator: (),
            merger: (),
            media_host: (),
            feed_store: (),
            channel: ChannelInfo::new(
                "Daily AI Papers",
                "https://arxiv.org",
                "Spoken summaries of the latest AI research papers from arXiv",
            ),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl<G, M, H, F> PodcastPipelineBuilder<G, M, H, F> {
    pub fn generator<G2: SummaryGenerator + Send + Sync + 'static>(
        self,
        generator: G2,
    ) -> PodcastPipelineBuilder<G2, M, H, F> {
        PodcastPipelineBuilder {
            workdir: self.workdir,
            generator,
            merger: self.merger,
            media_host: self.media_host,
            feed_store: self.feed_store,
            channel: self.channel,
            failure_policy: self.failure_policy,
        }
    }

    pub fn merger<M2: AudioMerger + Send + Sync + 'static>(
        self,
        merger: M2,
    ) -> PodcastPipelineBuilder<G, M2, H, F> {
        PodcastPipelineBuilder {
            workdir: self.workdir,
            generator: self.generator,
            merger,
            media_host: self.media_host,
            feed_store: self.feed_store,
            channel: self.channel,
            failure_policy: self.failure_policy,
        }
    }

    pub fn media_host<H2: MediaHost + Send + Sync + 'static>(
        self,
        media_host: H2,
    ) -> PodcastPipelineBuilder<G, M, H2, F> {
        PodcastPipelineBuilder {
            workdir: self.workdir,
            generator: self.generator,
            merger: self.merger,
            media_host,
            feed_store: self.feed_store,
            channel: self.channel,
            failure_policy: self.failure_policy,
        }
    }

    pub fn feed_store<F2: FeedStore + Send + Sync + 'static>(
        self,
        feed_store: F2,
    ) -> PodcastPipelineBuilder<G, M, H, F2> {
        PodcastPipelineBuilder {
            workdir: self.workdir,
            generator: self.generator,
            merger: self.merger,
            media_host: self.media_host,
            feed_store,
            channel: self.channel,
            failure_policy: self.failure_policy,
        }
    }

    /// Channel metadata used when the feed has to be created
    pub fn channel(mut self, channel: ChannelInfo) -> Self {
        self.channel = channel;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

impl<G, M, H, F> PodcastPipelineBuilder<G, M, H, F>
where
    G: SummaryGenerator + Send + Sync + 'static,
    M: AudioMerger + Send + Sync + 'static,
    H: MediaHost + Send + Sync + 'static,
    F: FeedStore + Send + Sync + 'static,
{
    pub fn build(self) -> PodcastPipeline<G, M, H, F> {
        PodcastPipeline {
            workdir: self.workdir,
            generator: self.generator,
            merger: Arc::new(self.merger),
            publisher: Publisher::new(self.media_host, self.feed_store, self.channel),
            failure_policy: self.failure_policy,
        }
    }
}
