//! Headless Chrome implementation of the rendering traits, via `chromiumoxide`.
//!
//! Request filtering uses the CDP `Fetch` domain: every request is paused,
//! then either continued or failed with `BlockedByClient` depending on the
//! [`ResourcePolicy`].

use super::{
    BrowserLauncher, BrowserSession, RenderPage, ResourceKind, ResourcePolicy, WaitCondition,
};
use crate::error::RenderError;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams as FetchEnableParams, EventRequestPaused,
    FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::cdp::browser_protocol::page::{EventDomContentEventFired, NavigateParams};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

/// Launches a local Chrome/Chromium process.
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    /// Explicit browser binary; auto-detected when `None`.
    pub executable: Option<PathBuf>,
    /// Show the browser window.
    pub headful: bool,
}

impl BrowserLauncher for ChromiumLauncher {
    type Session = ChromiumSession;

    #[instrument(level = "info", skip_all)]
    async fn launch(&self) -> Result<ChromiumSession, RenderError> {
        let mut builder = BrowserConfig::builder();
        if self.headful {
            builder = builder.with_head();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(RenderError::Session)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Session(e.to_string()))?;

        // The CDP connection only makes progress while the handler is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    trace!(error = %e, "Browser handler event error");
                }
            }
        });

        info!("Browser launched");
        Ok(ChromiumSession { browser, handler })
    }
}

/// A running Chrome process and its CDP event loop.
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession for ChromiumSession {
    type Page = ChromiumPage;

    async fn new_page(&self) -> Result<ChromiumPage, RenderError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::PageOpen(e.to_string()))?;
        Ok(ChromiumPage {
            page,
            interceptor: None,
        })
    }

    #[instrument(level = "info", skip_all)]
    async fn close(mut self) -> Result<(), RenderError> {
        let closed = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| RenderError::Session(e.to_string()));
        if let Err(e) = &closed {
            warn!(error = %e, "Browser refused to close, killing it");
            self.kill().await;
        }
        if !exited_within(self.browser.wait(), BROWSER_EXIT_GRACE).await {
            self.kill().await;
        }
        self.handler.abort();
        info!("Browser closed");
        closed
    }
}

impl ChromiumSession {
    async fn kill(&mut self) {
        if let Some(Err(e)) = self.browser.kill().await {
            warn!(error = %e, "Failed to kill browser process");
        }
    }
}

/// How long a closing browser process gets to exit before it is killed.
const BROWSER_EXIT_GRACE: Duration = Duration::from_secs(10);

/// Wait up to `grace` for a process exit. `false` when it failed or overran.
async fn exited_within<F, T, E>(exit: F, grace: Duration) -> bool
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(grace, exit).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            warn!(error = %e, "Browser process did not exit cleanly");
            false
        }
        Err(_) => {
            warn!(?grace, "Browser process still running after close");
            false
        }
    }
}

/// One tab with an optional request interceptor task.
pub struct ChromiumPage {
    page: Page,
    interceptor: Option<JoinHandle<()>>,
}

impl RenderPage for ChromiumPage {
    async fn apply_policy(&mut self, policy: &ResourcePolicy) -> Result<(), RenderError> {
        // Subscribe before enabling interception so no paused request is missed.
        let mut paused = self
            .page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(|e| RenderError::Filter(e.to_string()))?;

        let page = self.page.clone();
        let policy = policy.clone();
        self.interceptor = Some(tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let kind = resource_kind(&event.resource_type);
                let outcome = if policy.allows(kind) {
                    page.execute(ContinueRequestParams::new(event.request_id.clone()))
                        .await
                        .map(|_| ())
                } else {
                    page.execute(FailRequestParams::new(
                        event.request_id.clone(),
                        ErrorReason::BlockedByClient,
                    ))
                    .await
                    .map(|_| ())
                };
                if let Err(e) = outcome {
                    trace!(url = %event.request.url, ?kind, error = %e, "Interception reply failed");
                }
            }
        }));

        let enable = FetchEnableParams::builder()
            .pattern(RequestPattern::builder().url_pattern("*").build())
            .build();
        self.page
            .execute(enable)
            .await
            .map_err(|e| RenderError::Filter(e.to_string()))?;
        Ok(())
    }

    async fn navigate(&mut self, url: &str, wait: WaitCondition) -> Result<(), RenderError> {
        let failed = |reason: String| RenderError::Navigation {
            url: url.to_string(),
            reason,
        };

        match wait {
            WaitCondition::DomContentLoaded => {
                let mut dom_ready = self
                    .page
                    .event_listener::<EventDomContentEventFired>()
                    .await
                    .map_err(|e| failed(e.to_string()))?;
                let response = self
                    .page
                    .execute(NavigateParams::new(url))
                    .await
                    .map_err(|e| failed(e.to_string()))?;
                if let Some(error_text) = response.result.error_text.clone() {
                    return Err(failed(error_text));
                }
                dom_ready
                    .next()
                    .await
                    .ok_or_else(|| failed("page closed before DOMContentLoaded".to_string()))?;
            }
            WaitCondition::Load => {
                self.page
                    .goto(url)
                    .await
                    .map_err(|e| failed(e.to_string()))?;
            }
        }
        debug!(%url, "Navigation complete");
        Ok(())
    }

    async fn content(&self) -> Result<String, RenderError> {
        let url = self.page.url().await.ok().flatten().unwrap_or_default();
        self.page
            .content()
            .await
            .map_err(|e| RenderError::Content {
                url,
                reason: e.to_string(),
            })
    }

    async fn close(self) -> Result<(), RenderError> {
        if let Some(interceptor) = self.interceptor {
            interceptor.abort();
        }
        self.page
            .close()
            .await
            .map_err(|e| RenderError::PageOpen(e.to_string()))
    }
}

fn resource_kind(resource_type: &ResourceType) -> ResourceKind {
    match resource_type {
        ResourceType::Document => ResourceKind::Document,
        ResourceType::Stylesheet => ResourceKind::Stylesheet,
        ResourceType::Image => ResourceKind::Image,
        ResourceType::Media => ResourceKind::Media,
        ResourceType::Font => ResourceKind::Font,
        ResourceType::Script => ResourceKind::Script,
        ResourceType::Xhr => ResourceKind::Xhr,
        ResourceType::Fetch => ResourceKind::Fetch,
        _ => ResourceKind::Other,
    }
}
