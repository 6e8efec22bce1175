//! # Category Feed
//!
//! Builds an RSS (or JSON) feed from a video site's category listing. Both the
//! listing and every linked video page are rendered in headless Chrome, since
//! their content is filled in by client-side script.
//!
//! ## Usage
//!
//! ```sh
//! category_feed -c latest -o ./feeds/latest.xml
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Listing**: render the category page and discover video page URLs
//! 2. **Fan-out**: render every video page concurrently, one tab each
//! 3. **Assembly**: drop pages that failed, keep listing order for the rest
//! 4. **Output**: write the feed as RSS 2.0 or JSON
//!
//! Only the browser failing to start, or the listing page failing to render,
//! aborts a run. Individual video pages that fail are logged and skipped.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod error;
mod models;
mod outputs;
mod pipeline;
mod render;
mod scrapers;
mod utils;

use cli::Cli;
use models::KNOWN_CATEGORIES;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    if args.list_categories {
        for (token, label) in KNOWN_CATEGORIES {
            println!("{token:<16} {label}");
        }
        return Ok(());
    }

    let start_time = std::time::Instant::now();
    let request = args.feed_request();
    let config = args.pipeline_config();
    info!(category = %request.category, base_url = %config.base_url, "category_feed starting up");

    let feed = match pipeline::run(&args.launcher(), &config, &request).await {
        Ok(feed) => feed,
        Err(e) => {
            error!(error = %e, "Feed run failed");
            return Err(e.into());
        }
    };

    if let Err(e) = outputs::write_feed(&feed, args.format, args.output.as_deref()).await {
        error!(error = %e, "Failed to write feed");
        return Err(e);
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        items = feed.items.len(),
        "Execution complete"
    );
    Ok(())
}
