//! Data models flowing through the feed pipeline.
//!
//! Every value here is created and consumed within a single run:
//! - [`FeedRequest`]: which category listing to render
//! - [`RenderedPage`]: HTML returned by the browser for one URL
//! - [`DetailLink`]: a detail page discovered on the listing page
//! - [`ExtractedItem`]: fields pulled out of one detail page
//! - [`FeedItem`] / [`Feed`]: the externally consumed output

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category used when the request does not name one.
pub const DEFAULT_CATEGORY: &str = "latest";

/// Categories the upstream site is known to serve, with their display names.
///
/// Documentation only: unknown categories are passed through verbatim.
pub const KNOWN_CATEGORIES: [(&str, &str); 7] = [
    ("latest", "最新合集"),
    ("hd", "高清视频"),
    ("recent-favorite", "最近加精"),
    ("hot-list", "当前最热"),
    ("top-list", "本月最热"),
    ("month-discuss", "本月讨论"),
    ("top-favorite", "本月收藏"),
];

/// Input of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    /// Path token appended to `/video/category/`.
    pub category: String,
}

impl FeedRequest {
    /// Build a request, falling back to [`DEFAULT_CATEGORY`] for a missing or
    /// blank category.
    pub fn new(category: Option<&str>) -> Self {
        let category = match category.map(str::trim) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => DEFAULT_CATEGORY.to_string(),
        };
        Self { category }
    }
}

impl Default for FeedRequest {
    fn default() -> Self {
        Self::new(None)
    }
}

/// The rendered HTML of one URL.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// The URL that was navigated to.
    pub url: String,
    /// Serialized DOM after rendering.
    pub html: String,
}

/// A detail page linked from the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailLink {
    /// Absolute detail URL.
    pub url: String,
}

/// Fields read from a detail page, before the link is attached.
///
/// All fields may be missing when the page deviates from the expected
/// structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub title: String,
    pub video_source: Option<String>,
    pub poster_image: Option<String>,
    pub author_name: Option<String>,
    pub author_url: Option<String>,
    pub publish_date: Option<String>,
}

/// Everything known about one successfully rendered detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedItem {
    /// The detail URL.
    pub link: String,
    /// Title and media metadata.
    pub fields: DetailFields,
}

/// One entry of the published feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// HTML fragment with the publish date, author credit, poster and player.
    pub description: String,
    /// Publication time, when the page's date text carried a parseable stamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<DateTime<Utc>>,
}

/// The output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub title: String,
    /// The listing URL the feed was built from.
    pub link: String,
    pub description: String,
    /// Surviving items in listing order.
    pub items: Vec<FeedItem>,
}
