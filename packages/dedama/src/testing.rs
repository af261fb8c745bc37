//! Testing utilities including a fake automation backend.
//!
//! [`FakeSite`] serves HTML fixtures keyed by URL and records every call made
//! against it, so tests can drive the navigator and coordinator without a
//! network and assert on exactly which queries ran.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;

use crate::automation::query::{run_query, Query, QueryOutput};
use crate::error::{AutomationError, AutomationResult};
use crate::traits::automation::{Browser, PageAutomation};

/// Record of a call made to the fake backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    Open,
    Navigate { url: String },
    Evaluate { query: Query },
    Click { selector: String, index: usize },
    Screenshot { path: PathBuf },
    Close,
}

/// In-memory site: URL to HTML, plus call tracking.
///
/// Clones share pages and call history.
#[derive(Clone, Default)]
pub struct FakeSite {
    pages: Arc<RwLock<HashMap<String, String>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    calls: Arc<RwLock<Vec<FakeCall>>>,
    navigate_delay: Duration,
    fail_open: bool,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` at `url`.
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.write().unwrap().insert(url.into(), html.into());
        self
    }

    /// Navigating to `url` times out.
    pub fn with_failing_url(self, url: impl Into<String>) -> Self {
        self.failing.write().unwrap().insert(url.into());
        self
    }

    /// Every navigation sleeps this long before completing.
    pub fn with_navigate_delay(mut self, delay: Duration) -> Self {
        self.navigate_delay = delay;
        self
    }

    /// Opening a page fails.
    pub fn with_failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Get all calls made so far.
    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.read().unwrap().clone()
    }

    /// URLs navigated to, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                FakeCall::Navigate { url } => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of evaluated queries that used `selector`.
    pub fn evaluate_count(&self, selector: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, FakeCall::Evaluate { query } if query.selector() == Some(selector)))
            .count()
    }

    /// Number of pages opened.
    pub fn open_count(&self) -> usize {
        self.count(|c| matches!(c, FakeCall::Open))
    }

    /// Number of pages closed.
    pub fn close_count(&self) -> usize {
        self.count(|c| matches!(c, FakeCall::Close))
    }

    /// Clear call history.
    pub fn reset_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn count(&self, pred: impl Fn(&FakeCall) -> bool) -> usize {
        self.calls.read().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: FakeCall) {
        self.calls.write().unwrap().push(call);
    }
}

/// Opens [`FakePage`]s over a [`FakeSite`].
#[derive(Clone)]
pub struct FakeBrowser {
    site: FakeSite,
}

impl FakeBrowser {
    pub fn new(site: FakeSite) -> Self {
        Self { site }
    }

    pub fn site(&self) -> &FakeSite {
        &self.site
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    type Page = FakePage;

    async fn open_page(&self) -> AutomationResult<FakePage> {
        self.site.record(FakeCall::Open);
        if self.site.fail_open {
            return Err(AutomationError::Unsupported("fake browser refused to open".into()));
        }
        Ok(FakePage {
            site: self.site.clone(),
            current: RwLock::new(None),
        })
    }
}

/// A page whose current document is one of the site's fixtures.
pub struct FakePage {
    site: FakeSite,
    current: RwLock<Option<String>>,
}

impl FakePage {
    fn run(&self, query: &Query) -> AutomationResult<QueryOutput> {
        let url = self
            .current
            .read()
            .unwrap()
            .clone()
            .ok_or(AutomationError::NoPage)?;
        let html = self
            .site
            .pages
            .read()
            .unwrap()
            .get(&url)
            .cloned()
            .ok_or(AutomationError::NoPage)?;
        let base = Url::parse(&url).map_err(|_| AutomationError::InvalidUrl { url: url.clone() })?;
        run_query(&html, &base, query)
    }
}

#[async_trait]
impl PageAutomation for FakePage {
    async fn navigate(&self, url: &str) -> AutomationResult<()> {
        self.site.record(FakeCall::Navigate {
            url: url.to_string(),
        });

        if !self.site.navigate_delay.is_zero() {
            tokio::time::sleep(self.site.navigate_delay).await;
        }

        if self.site.failing.read().unwrap().contains(url) {
            return Err(AutomationError::Timeout {
                url: url.to_string(),
            });
        }
        if !self.site.pages.read().unwrap().contains_key(url) {
            return Err(AutomationError::Status {
                url: url.to_string(),
                status: 404,
            });
        }

        *self.current.write().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> Option<String> {
        self.current.read().unwrap().clone()
    }

    async fn evaluate(&self, query: &Query) -> AutomationResult<QueryOutput> {
        self.site.record(FakeCall::Evaluate {
            query: query.clone(),
        });
        self.run(query)
    }

    async fn click(&self, selector: &str, index: usize) -> AutomationResult<()> {
        self.site.record(FakeCall::Click {
            selector: selector.to_string(),
            index,
        });

        let controls = self.run(&Query::controls(selector))?.into_controls()?;
        let href = controls
            .into_iter()
            .find(|c| c.index == index)
            .ok_or_else(|| AutomationError::NoSuchElement {
                selector: selector.to_string(),
                index,
            })?
            .href
            .ok_or_else(|| AutomationError::Unsupported("control has no target".into()))?;

        self.navigate(&href).await
    }

    async fn screenshot(&self, path: &Path) -> AutomationResult<()> {
        self.site.record(FakeCall::Screenshot {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    async fn close(&self) -> AutomationResult<()> {
        self.site.record(FakeCall::Close);
        *self.current.write().unwrap() = None;
        Ok(())
    }
}
