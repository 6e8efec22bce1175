//! Error types for rendering and feed assembly.
//!
//! Errors fall into two tiers:
//! - [`FeedError`]: fatal for a whole run (browser unavailable, listing page
//!   could not be rendered). No partial feed is produced.
//! - [`DetailFailure`]: local to one detail page. The item is dropped and the
//!   run carries on.
//!
//! [`RenderError`] is the cause carried by both.

use std::time::Duration;
use thiserror::Error;

/// Failure while driving the headless browser.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// The browser process or its connection could not be established.
    #[error("browser session unavailable: {0}")]
    Session(String),

    /// A new page could not be opened in the session.
    #[error("failed to open page: {0}")]
    PageOpen(String),

    /// The resource-filtering policy could not be installed on a page.
    #[error("failed to install request filter: {0}")]
    Filter(String),

    /// Navigation did not reach the wait condition in time.
    #[error("navigation to {url} timed out after {timeout:?}")]
    Timeout {
        /// Target URL
        url: String,
        /// Configured per-navigation bound
        timeout: Duration,
    },

    /// The browser reported a navigation failure.
    #[error("navigation to {url} failed: {reason}")]
    Navigation {
        /// Target URL
        url: String,
        /// Browser-reported reason
        reason: String,
    },

    /// The rendered document could not be read back.
    #[error("failed to read rendered content of {url}: {reason}")]
    Content {
        /// Target URL
        url: String,
        /// Browser-reported reason
        reason: String,
    },
}

/// Run-aborting failure of the feed pipeline.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The browser session could not be acquired.
    #[error("browser session could not be acquired: {0}")]
    SessionUnavailable(#[source] RenderError),

    /// The listing page could not be rendered.
    #[error("listing page {url} unavailable: {source}")]
    ListingUnavailable {
        /// Listing URL
        url: String,
        /// Underlying render failure
        #[source]
        source: RenderError,
    },

    /// The listing URL could not be built from the base origin and category.
    #[error("invalid listing url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// A detail page that could not be turned into an item.
#[derive(Debug, Clone, Error)]
#[error("detail page {url} failed: {cause}")]
pub struct DetailFailure {
    /// The detail URL that failed
    pub url: String,
    /// What went wrong
    pub cause: RenderError,
}
