use chrono::{DateTime, Utc};
use rss::{Enclosure, Guid, Item};

pub const DEFAULT_MIME_TYPE: &str = "audio/mpeg";

/// A single published episode as it appears in the feed.
///
/// The enclosure URL doubles as the item's guid so feed readers can identify
/// the episode no matter how often the feed is rewritten.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub description: String,
    pub enclosure_url: String,
    pub mime_type: String,
    /// Byte length of the enclosure, `None` when unknown
    pub length: Option<u64>,
    pub published_at: DateTime<Utc>,
}

impl FeedEntry {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        enclosure_url: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            enclosure_url: enclosure_url.into(),
            mime_type: DEFAULT_MIME_TYPE.into(),
            length: None,
            published_at,
        }
    }

    pub fn with_length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn guid(&self) -> &str {
        &self.enclosure_url
    }

    /// RFC-822 style publish date, always rendered in UTC
    pub fn pub_date(&self) -> String {
        self.published_at.to_rfc2822()
    }

    pub(crate) fn into_rss_item(self) -> Item {
        let pub_date = self.pub_date();

        let mut enclosure = Enclosure::default();
        enclosure.set_url(self.enclosure_url.clone());
        enclosure.set_mime_type(self.mime_type);
        // 0 is the conventional "unknown" length
        enclosure.set_length(self.length.unwrap_or(0).to_string());

        let mut guid = Guid::default();
        guid.set_value(self.enclosure_url);
        guid.set_permalink(true);

        let mut item = Item::default();
        item.set_title(self.title);
        item.set_description(self.description);
        item.set_enclosure(enclosure);
        item.set_guid(guid);
        item.set_pub_date(pub_date);
        item
    }
}

/// Channel-level metadata used when a feed has to be created from scratch
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: Option<String>,
}

impl ChannelInfo {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            description: description.into(),
            language: Some("en-us".into()),
        }
    }
}
