//! The listing → detail fan-out that produces a [`Feed`].
//!
//! One run:
//! 1. acquire a browser session
//! 2. render the category listing and extract detail links
//! 3. render and extract every detail page concurrently
//! 4. drop the detail pages that failed, keep listing order for the rest
//! 5. release the session
//!
//! Only steps 1 and 2 can fail a run. A detail page that fails is logged and
//! left out of the feed; it is never retried within the same run.

use crate::error::{DetailFailure, FeedError};
use crate::models::{DetailLink, ExtractedItem, Feed, FeedItem, FeedRequest};
use crate::outputs::description::render_description;
use crate::render::{
    BrowserLauncher, BrowserSession, RenderingClient, ResourcePolicy, WaitCondition,
};
use crate::scrapers::porny::{extract_detail, extract_listing};
use crate::utils::{parse_publish_date, truncate_for_log};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use itertools::{Either, Itertools};
use std::num::NonZeroUsize;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Default upstream origin.
pub const DEFAULT_BASE_URL: &str = "https://91porny.com";
/// Default site name used in the feed title.
pub const DEFAULT_SITE_NAME: &str = "91porny";
/// Default bound on each navigation.
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by every stage of a run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Origin that listing paths and relative links resolve against.
    pub base_url: Url,
    /// Name shown in the feed title.
    pub site_name: String,
    /// Applied to listing and detail navigations alike.
    pub navigation_timeout: Duration,
    pub wait_condition: WaitCondition,
    /// Ceiling on concurrent detail fetches; `None` fetches all at once.
    pub max_concurrency: Option<NonZeroUsize>,
    pub policy: ResourcePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            site_name: DEFAULT_SITE_NAME.to_string(),
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            wait_condition: WaitCondition::default(),
            max_concurrency: None,
            policy: ResourcePolicy::document_only(),
        }
    }
}

impl PipelineConfig {
    /// `{base}/video/category/{category}`, with the category passed through.
    pub fn listing_url(&self, category: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(&format!("/video/category/{category}"))
    }

    fn feed_title(&self, category: &str) -> String {
        format!("{} - {} 分类视频", self.site_name, category)
    }
}

/// Build the feed for `request`.
///
/// The browser session is acquired once and released once, whatever the
/// outcome. Fails when the listing URL cannot be built from the base URL
/// (checked before any browser starts), when the session cannot be acquired,
/// or when the listing page cannot be rendered.
#[instrument(level = "info", skip(launcher, config), fields(category = %request.category))]
pub async fn run<L: BrowserLauncher>(
    launcher: &L,
    config: &PipelineConfig,
    request: &FeedRequest,
) -> Result<Feed, FeedError> {
    let listing_url = config.listing_url(&request.category)?;

    let session = launcher
        .launch()
        .await
        .map_err(FeedError::SessionUnavailable)?;

    let outcome = run_in_session(&session, config, request, &listing_url).await;

    if let Err(e) = session.close().await {
        warn!(error = %e, "Failed to release browser session");
    }
    outcome
}

async fn run_in_session<S: BrowserSession>(
    session: &S,
    config: &PipelineConfig,
    request: &FeedRequest,
    listing_url: &Url,
) -> Result<Feed, FeedError> {
    let client = RenderingClient::new(session, config.policy.clone());

    let listing = client
        .render(
            listing_url.as_str(),
            config.wait_condition,
            config.navigation_timeout,
        )
        .await
        .map_err(|source| {
            error!(url = %listing_url, error = %source, "Listing page unavailable");
            FeedError::ListingUnavailable {
                url: listing_url.to_string(),
                source,
            }
        })?;

    let links = extract_listing(&listing.html, &config.base_url);
    info!(count = links.len(), url = %listing_url, "Indexed detail links");
    if links.is_empty() {
        debug!(preview = %truncate_for_log(&listing.html, 300), "Listing yielded no detail links");
    }

    let outcomes = fetch_all(&client, config, &links).await;
    let (extracted, failures): (Vec<ExtractedItem>, Vec<DetailFailure>) =
        outcomes.into_iter().partition_map(|outcome| match outcome {
            Ok(item) => Either::Left(item),
            Err(failure) => Either::Right(failure),
        });

    info!(
        total = links.len(),
        successful = extracted.len(),
        failed = failures.len(),
        "Completed detail fetching"
    );

    let title = config.feed_title(&request.category);
    Ok(Feed {
        description: title.clone(),
        title,
        link: listing_url.to_string(),
        items: extracted.into_iter().map(into_feed_item).collect(),
    })
}

/// Fetch every link, keeping results in link order.
async fn fetch_all<S: BrowserSession>(
    client: &RenderingClient<'_, S>,
    config: &PipelineConfig,
    links: &[DetailLink],
) -> Vec<Result<ExtractedItem, DetailFailure>> {
    let workers = links.iter().map(|link| fetch_detail(client, config, &link.url));
    match config.max_concurrency {
        None => join_all(workers).await,
        Some(limit) => {
            debug!(limit = limit.get(), "Bounding detail concurrency");
            stream::iter(workers).buffered(limit.get()).collect().await
        }
    }
}

/// Render one detail page and read its fields.
///
/// Every failure is returned as a [`DetailFailure`] naming the URL.
#[instrument(level = "info", skip(client, config))]
pub async fn fetch_detail<S: BrowserSession>(
    client: &RenderingClient<'_, S>,
    config: &PipelineConfig,
    url: &str,
) -> Result<ExtractedItem, DetailFailure> {
    match client
        .render(url, config.wait_condition, config.navigation_timeout)
        .await
    {
        Ok(page) => {
            let fields = extract_detail(&page.html, &config.base_url);
            debug!(%url, title = %fields.title, "Extracted detail page");
            Ok(ExtractedItem {
                link: page.url,
                fields,
            })
        }
        Err(cause) => {
            error!(%url, error = %cause, "Detail fetch failed; skipping item");
            Err(DetailFailure {
                url: url.to_string(),
                cause,
            })
        }
    }
}

fn into_feed_item(item: ExtractedItem) -> FeedItem {
    let description = render_description(&item.fields);
    let pub_date = item.fields.publish_date.as_deref().and_then(parse_publish_date);
    FeedItem {
        title: item.fields.title,
        link: item.link,
        description,
        pub_date,
    }
}
