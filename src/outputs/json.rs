//! JSON serialization of a [`Feed`].
//!
//! The document mirrors the [`Feed`] model:
//!
//! ```text
//! {
//!   "title": "91porny - latest 分类视频",
//!   "link": "https://91porny.com/video/category/latest",
//!   "description": "...",
//!   "items": [ { "title", "link", "description", "pub_date"? } ]
//! }
//! ```

use crate::models::Feed;
use std::error::Error;
use tracing::{debug, instrument};

/// Render `feed` as pretty-printed JSON.
#[instrument(level = "info", skip_all, fields(items = feed.items.len()))]
pub fn feed_to_json(feed: &Feed) -> Result<String, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(feed)?;
    debug!(bytes = json.len(), "Rendered JSON");
    Ok(json)
}
