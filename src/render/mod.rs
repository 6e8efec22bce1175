//! Headless rendering of pages behind a small set of traits.
//!
//! The pipeline never talks to a concrete browser. It is generic over:
//! - [`BrowserLauncher`]: acquires a [`BrowserSession`] once per run
//! - [`BrowserSession`]: opens isolated [`RenderPage`]s and is closed at the end
//! - [`RenderPage`]: applies a [`ResourcePolicy`], navigates, returns HTML
//!
//! [`RenderingClient`] composes these into a single `render` call that always
//! releases the page it opened. The production implementation lives in
//! [`chromium`]; tests use [`fake`].

pub mod chromium;
#[cfg(test)]
pub mod fake;

use crate::error::RenderError;
use crate::models::RenderedPage;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, instrument, warn};

/// Kind of network request a page issues, as far as filtering cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Document,
    Stylesheet,
    Image,
    Media,
    Font,
    Script,
    Xhr,
    Fetch,
    Other,
}

/// Which requests a page may complete. Everything not allowed is aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePolicy {
    allowed: Vec<ResourceKind>,
}

impl ResourcePolicy {
    /// Allow only the top-level document request.
    pub fn document_only() -> Self {
        Self {
            allowed: vec![ResourceKind::Document],
        }
    }

    pub fn allows(&self, kind: ResourceKind) -> bool {
        self.allowed.contains(&kind)
    }
}

impl Default for ResourcePolicy {
    fn default() -> Self {
        Self::document_only()
    }
}

/// Point in the page lifecycle at which navigation counts as done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum WaitCondition {
    /// `DOMContentLoaded` fired.
    #[default]
    DomContentLoaded,
    /// `load` fired.
    Load,
}

/// Starts a browser and hands back a session.
pub trait BrowserLauncher {
    type Session: BrowserSession;

    async fn launch(&self) -> Result<Self::Session, RenderError>;
}

/// A running browser shared by every page of one run.
pub trait BrowserSession {
    type Page: RenderPage;

    /// Open a fresh, isolated page.
    async fn new_page(&self) -> Result<Self::Page, RenderError>;

    /// Shut the browser down.
    async fn close(self) -> Result<(), RenderError>;
}

/// One page (tab) inside a session.
pub trait RenderPage {
    /// Install the request filter. Must be called before [`navigate`](Self::navigate).
    async fn apply_policy(&mut self, policy: &ResourcePolicy) -> Result<(), RenderError>;

    /// Navigate and wait for `wait`. Not time-bounded by itself.
    async fn navigate(&mut self, url: &str, wait: WaitCondition) -> Result<(), RenderError>;

    /// Serialized DOM of the current document.
    async fn content(&self) -> Result<String, RenderError>;

    async fn close(self) -> Result<(), RenderError>;
}

/// Renders URLs to HTML inside a borrowed session, one page per call.
#[derive(Debug)]
pub struct RenderingClient<'s, S> {
    session: &'s S,
    policy: ResourcePolicy,
}

impl<'s, S: BrowserSession> RenderingClient<'s, S> {
    pub fn new(session: &'s S, policy: ResourcePolicy) -> Self {
        Self { session, policy }
    }

    /// Render `url` and return its HTML.
    ///
    /// `timeout` bounds the whole call: opening the page, installing the
    /// filter, navigating to `wait` and reading the content. Overrunning it
    /// fails with [`RenderError::Timeout`]. The page opened for this call is
    /// closed on every path.
    #[instrument(level = "debug", skip(self), fields(%url))]
    pub async fn render(
        &self,
        url: &str,
        wait: WaitCondition,
        timeout: Duration,
    ) -> Result<RenderedPage, RenderError> {
        let timed_out = || RenderError::Timeout {
            url: url.to_string(),
            timeout,
        };
        let deadline = Instant::now() + timeout;

        let mut page = match timeout_at(deadline, self.session.new_page()).await {
            Ok(opened) => opened?,
            Err(_) => return Err(timed_out()),
        };
        let outcome = match timeout_at(deadline, self.render_in(&mut page, url, wait)).await {
            Ok(rendered) => rendered,
            Err(_) => Err(timed_out()),
        };
        if let Err(e) = page.close().await {
            warn!(%url, error = %e, "Failed to release page");
        }
        outcome
    }

    async fn render_in(
        &self,
        page: &mut S::Page,
        url: &str,
        wait: WaitCondition,
    ) -> Result<RenderedPage, RenderError> {
        page.apply_policy(&self.policy).await?;

        debug!(%url, ?wait, "Requesting");
        page.navigate(url, wait).await?;

        let html = page.content().await?;
        debug!(%url, bytes = html.len(), "Rendered");
        Ok(RenderedPage {
            url: url.to_string(),
            html,
        })
    }
}
