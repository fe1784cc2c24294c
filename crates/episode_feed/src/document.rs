use std::string::FromUtf8Error;

use chrono::Utc;
use rss::Channel;

use crate::domain::{ChannelInfo, FeedEntry};

#[derive(Debug, thiserror::Error)]
pub enum FeedDocumentError {
    #[error("failed to parse feed document: {0}")]
    Parse(#[source] rss::Error),
    #[error("failed to serialize feed document: {0}")]
    Serialize(#[source] rss::Error),
    #[error("feed document is not valid UTF-8: {0}")]
    Encoding(#[from] FromUtf8Error),
}

/// An RSS 2.0 document (`rss > channel > item*`) that only ever grows.
///
/// Existing items are carried over verbatim; the only mutation offered is
/// [`FeedDocument::append`].
#[derive(Debug, Clone)]
pub struct FeedDocument {
    channel: Channel,
}

impl FeedDocument {
    /// Creates a minimally valid document with channel metadata and no items
    pub fn new(info: &ChannelInfo) -> Self {
        let mut channel = Channel::default();
        channel.set_title(info.title.clone());
        channel.set_link(info.link.clone());
        channel.set_description(info.description.clone());
        channel.set_language(info.language.clone());
        channel.set_generator(Some("paper-pulse".to_string()));

        FeedDocument { channel }
    }

    pub fn parse(xml: &str) -> Result<Self, FeedDocumentError> {
        let channel = Channel::read_from(xml.as_bytes()).map_err(FeedDocumentError::Parse)?;
        Ok(FeedDocument { channel })
    }

    pub fn append(&mut self, entry: FeedEntry) {
        let mut items = self.channel.items().to_vec();
        items.push(entry.into_rss_item());
        self.channel.set_items(items);
        self.channel
            .set_last_build_date(Some(Utc::now().to_rfc2822()));
    }

    pub fn len(&self) -> usize {
        self.channel.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.items().is_empty()
    }

    pub fn guids(&self) -> impl Iterator<Item = &str> {
        self.channel
            .items()
            .iter()
            .filter_map(|item| item.guid().map(|guid| guid.value()))
    }

    pub fn contains_guid(&self, guid: &str) -> bool {
        self.guids().any(|g| g == guid)
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn to_xml(&self) -> Result<String, FeedDocumentError> {
        let buf = self
            .channel
            .write_to(Vec::new())
            .map_err(FeedDocumentError::Serialize)?;
        Ok(String::from_utf8(buf)?)
    }
}
