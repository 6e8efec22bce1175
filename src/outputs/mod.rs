//! Output generation for finished feeds.
//!
//! # Submodules
//!
//! - [`rss`]: RSS 2.0 document for feed readers
//! - [`json`]: JSON document for API consumers
//! - [`description`]: the HTML fragment embedded in every item
//!
//! [`write_feed`] picks a format and writes to a file or stdout.

pub mod description;
pub mod json;
pub mod rss;

use crate::models::Feed;
use crate::utils::ensure_parent_dir;
use chrono::Utc;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

/// Serialization format of the written feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Rss,
    Json,
}

/// Serialize `feed` in `format`.
pub fn render_feed(feed: &Feed, format: OutputFormat) -> Result<String, Box<dyn Error>> {
    match format {
        OutputFormat::Rss => rss::feed_to_rss(feed, Utc::now()),
        OutputFormat::Json => json::feed_to_json(feed),
    }
}

/// Write `feed` to `output`, or to stdout when no path is given.
#[instrument(level = "info", skip(feed), fields(items = feed.items.len()))]
pub async fn write_feed(
    feed: &Feed,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let body = render_feed(feed, format)?;

    match output {
        Some(path) => {
            ensure_parent_dir(path).await?;
            fs::write(path, body).await?;
            info!(path = %path.display(), "Wrote feed");
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(body.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_feed() -> Feed {
        Feed {
            title: "91porny - latest 分类视频".to_string(),
            link: "https://91porny.com/video/category/latest".to_string(),
            description: "91porny - latest 分类视频".to_string(),
            items: vec![],
        }
    }

    #[test]
    fn test_render_feed_picks_format() {
        let rss = render_feed(&empty_feed(), OutputFormat::Rss).unwrap();
        assert!(rss.contains("<rss"));
        let json = render_feed(&empty_feed(), OutputFormat::Json).unwrap();
        assert!(json.trim_start().starts_with('{'));
    }

    #[tokio::test]
    async fn test_write_feed_to_file() {
        let dir = std::env::temp_dir().join(format!("category_feed_out_{}", std::process::id()));
        let path = dir.join("feeds/latest.json");

        write_feed(&empty_feed(), OutputFormat::Json, Some(&path))
            .await
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("https://91porny.com/video/category/latest"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
