//! Command-line interface definitions for Category Feed.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Most options can also be provided via environment variables.

use crate::models::FeedRequest;
use crate::outputs::OutputFormat;
use crate::pipeline::{DEFAULT_BASE_URL, DEFAULT_SITE_NAME, PipelineConfig};
use crate::render::{ResourcePolicy, WaitCondition};
use crate::render::chromium::ChromiumLauncher;
use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Command-line arguments for the Category Feed application.
///
/// # Examples
///
/// ```sh
/// # Latest uploads as RSS on stdout
/// category_feed
///
/// # Monthly top list as JSON, at most 8 pages open at once
/// category_feed -c top-list -f json -o ./feeds/top-list.json --max-concurrency 8
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Category path token (see --list-categories); defaults to "latest"
    #[arg(short, long, env = "FEED_CATEGORY")]
    pub category: Option<String>,

    /// Origin of the upstream site
    #[arg(long, env = "FEED_BASE_URL", default_value = DEFAULT_BASE_URL, value_parser = parse_base_url)]
    pub base_url: Url,

    /// Site name used in the feed title
    #[arg(long, env = "FEED_SITE_NAME", default_value = DEFAULT_SITE_NAME)]
    pub site_name: String,

    /// Per-page render timeout in seconds, for listing and detail pages
    #[arg(
        long,
        env = "FEED_TIMEOUT_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Page lifecycle event that ends a navigation
    #[arg(long, value_enum, default_value_t = WaitCondition::DomContentLoaded)]
    pub wait_until: WaitCondition,

    /// Maximum detail pages rendered at once (unbounded when omitted)
    #[arg(long, env = "FEED_MAX_CONCURRENCY")]
    pub max_concurrency: Option<NonZeroUsize>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Rss)]
    pub format: OutputFormat,

    /// Output file; the feed is printed to stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to the Chrome/Chromium executable
    #[arg(long, env = "CHROME")]
    pub chrome_executable: Option<PathBuf>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headful: bool,

    /// Print the known categories and exit
    #[arg(long)]
    pub list_categories: bool,
}

impl Cli {
    pub fn feed_request(&self) -> FeedRequest {
        FeedRequest::new(self.category.as_deref())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            base_url: self.base_url.clone(),
            site_name: self.site_name.clone(),
            navigation_timeout: Duration::from_secs(self.timeout_secs),
            wait_condition: self.wait_until,
            max_concurrency: self.max_concurrency,
            policy: ResourcePolicy::document_only(),
        }
    }

    pub fn launcher(&self) -> ChromiumLauncher {
        ChromiumLauncher {
            executable: self.chrome_executable.clone(),
            headful: self.headful,
        }
    }
}

/// Accept only http(s) origins; listing and detail links are joined onto it.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" if !url.cannot_be_a_base() => Ok(url),
        scheme => Err(format!("expected an http(s) origin, got scheme `{scheme}`")),
    }
}
