//! In-memory browser for tests.
//!
//! Serves canned HTML per URL, can delay, fail or hang a navigation or stall
//! the content read, and counts every acquire/release so tests can check
//! nothing leaks.

use super::{BrowserLauncher, BrowserSession, RenderPage, ResourcePolicy, WaitCondition};
use crate::error::RenderError;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// How the fake answers a navigation.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    Html(String),
    Delayed(Duration, String),
    Fail(String),
    Hang,
    /// Navigation succeeds but reading the content never completes.
    StallContent(String),
}

impl FakeResponse {
    pub fn html(html: &str) -> Self {
        Self::Html(html.to_string())
    }

    pub fn delayed(millis: u64, html: &str) -> Self {
        Self::Delayed(Duration::from_millis(millis), html.to_string())
    }
}

#[derive(Debug, Default)]
pub struct Counters {
    sessions_opened: AtomicUsize,
    sessions_closed: AtomicUsize,
    pages_opened: AtomicUsize,
    pages_closed: AtomicUsize,
    policies_applied: AtomicUsize,
    unfiltered_navigations: AtomicUsize,
}

impl Counters {
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }
    pub fn sessions_closed(&self) -> usize {
        self.sessions_closed.load(Ordering::SeqCst)
    }
    pub fn pages_opened(&self) -> usize {
        self.pages_opened.load(Ordering::SeqCst)
    }
    pub fn pages_closed(&self) -> usize {
        self.pages_closed.load(Ordering::SeqCst)
    }
    pub fn policies_applied(&self) -> usize {
        self.policies_applied.load(Ordering::SeqCst)
    }
    pub fn unfiltered_navigations(&self) -> usize {
        self.unfiltered_navigations.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct Inner {
    pages: HashMap<String, FakeResponse>,
    refuse_launch: bool,
    counters: Counters,
}

#[derive(Debug, Clone, Default)]
pub struct FakeBrowser {
    inner: Arc<Inner>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, response: FakeResponse) -> Self {
        Arc::get_mut(&mut self.inner)
            .expect("configure FakeBrowser before launching it")
            .pages
            .insert(url.to_string(), response);
        self
    }

    pub fn refusing_launch(mut self) -> Self {
        Arc::get_mut(&mut self.inner)
            .expect("configure FakeBrowser before launching it")
            .refuse_launch = true;
        self
    }

    pub fn counters(&self) -> &Counters {
        &self.inner.counters
    }
}

impl BrowserLauncher for FakeBrowser {
    type Session = FakeSession;

    async fn launch(&self) -> Result<FakeSession, RenderError> {
        if self.inner.refuse_launch {
            return Err(RenderError::Session("no chrome executable found".to_string()));
        }
        self.inner.counters.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            inner: Arc::clone(&self.inner),
        })
    }
}

#[derive(Debug)]
pub struct FakeSession {
    inner: Arc<Inner>,
}

impl BrowserSession for FakeSession {
    type Page = FakePage;

    async fn new_page(&self) -> Result<FakePage, RenderError> {
        self.inner.counters.pages_opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakePage {
            inner: Arc::clone(&self.inner),
            filtered: false,
            html: None,
            stall_content: false,
        })
    }

    async fn close(self) -> Result<(), RenderError> {
        self.inner.counters.sessions_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug)]
pub struct FakePage {
    inner: Arc<Inner>,
    filtered: bool,
    html: Option<String>,
    stall_content: bool,
}

impl RenderPage for FakePage {
    async fn apply_policy(&mut self, _policy: &ResourcePolicy) -> Result<(), RenderError> {
        self.inner.counters.policies_applied.fetch_add(1, Ordering::SeqCst);
        self.filtered = true;
        Ok(())
    }

    async fn navigate(&mut self, url: &str, _wait: WaitCondition) -> Result<(), RenderError> {
        if !self.filtered {
            self.inner
                .counters
                .unfiltered_navigations
                .fetch_add(1, Ordering::SeqCst);
        }
        let html = match self.inner.pages.get(url).cloned() {
            Some(FakeResponse::Html(html)) => html,
            Some(FakeResponse::Delayed(delay, html)) => {
                tokio::time::sleep(delay).await;
                html
            }
            Some(FakeResponse::Fail(reason)) => {
                return Err(RenderError::Navigation {
                    url: url.to_string(),
                    reason,
                });
            }
            Some(FakeResponse::Hang) => std::future::pending().await,
            Some(FakeResponse::StallContent(html)) => {
                self.stall_content = true;
                html
            }
            None => {
                return Err(RenderError::Navigation {
                    url: url.to_string(),
                    reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
                });
            }
        };
        self.html = Some(html);
        Ok(())
    }

    async fn content(&self) -> Result<String, RenderError> {
        if self.stall_content {
            std::future::pending::<()>().await;
        }
        Ok(self.html.clone().unwrap_or_default())
    }

    async fn close(self) -> Result<(), RenderError> {
        self.inner.counters.pages_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
