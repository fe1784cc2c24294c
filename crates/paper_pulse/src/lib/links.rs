//! # Link extraction
//!
//! Finds arXiv paper URLs in free-form email text. The `abs` and `pdf` forms
//! of the same paper are kept as distinct links.

use std::{fmt, str::FromStr, sync::LazyLock};

use itertools::Itertools;
use regex::{Captures, Regex};
use serde::{Serialize, Serializer};

static ARXIV_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://arxiv\.org/(abs|pdf)/(\d+\.\d+)(?:v(\d+))?").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Abs,
    Pdf,
}

/// A validated arXiv URL (`abs` or `pdf` path, optional version suffix)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaperLink {
    url: String,
    kind: LinkKind,
    paper_id: String,
    version: Option<u32>,
}

impl PaperLink {
    fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        let url = caps.get(0)?.as_str().to_string();
        let kind = match caps.get(1)?.as_str() {
            "abs" => LinkKind::Abs,
            _ => LinkKind::Pdf,
        };
        let paper_id = caps.get(2)?.as_str().to_string();
        let version = caps.get(3).and_then(|m| m.as_str().parse().ok());

        Some(PaperLink {
            url,
            kind,
            paper_id,
            version,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> LinkKind {
        self.kind
    }

    /// The arXiv identifier without version, e.g. `2301.00001`
    pub fn paper_id(&self) -> &str {
        &self.paper_id
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }
}

impl fmt::Display for PaperLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl Serialize for PaperLink {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.url)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("'{0}' is not an arXiv paper link")]
pub struct InvalidPaperLink(String);

impl FromStr for PaperLink {
    type Err = InvalidPaperLink;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ARXIV_LINK_RE
            .captures(s)
            .filter(|caps| caps.get(0).is_some_and(|m| m.start() == 0 && m.end() == s.len()))
            .and_then(|caps| PaperLink::from_captures(&caps))
            .ok_or_else(|| InvalidPaperLink(s.to_string()))
    }
}

/// Returns the distinct arXiv links found in `text`, in order of first
/// appearance. Never fails; text without links yields an empty list.
pub fn extract_paper_links(text: &str) -> Vec<PaperLink> {
    ARXIV_LINK_RE
        .captures_iter(text)
        .filter_map(|caps| PaperLink::from_captures(&caps))
        .unique()
        .collect()
}
