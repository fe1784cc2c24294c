//! # Episode Feed
//!
//! This module owns the podcast's only long-lived state: the RSS 2.0 feed
//! document that lists every published episode.
//!
//! It provides the feed document model, a storage abstraction the document is
//! loaded from and persisted to (a local file or a file in a GitHub
//! repository), and the GitHub contents client shared with the media
//! publisher.

mod document;
mod domain;
mod feedstore;
pub mod github;

pub use document::{FeedDocument, FeedDocumentError};
pub use domain::{ChannelInfo, FeedEntry, DEFAULT_MIME_TYPE};
pub use feedstore::github::GithubFeedStore;
pub use feedstore::local::LocalFeedStore;
pub use feedstore::{FeedStore, FeedStoreError, StoredFeed};
