//! HTTP-backed page automation.
//!
//! Fetches documents with reqwest and answers queries over the returned
//! markup. It does not execute scripts: quiescence means the response body
//! has been read and the settle delay has elapsed, controls are activated by
//! following their `href`, and a "screenshot" is an HTML snapshot.

use async_trait::async_trait;
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::query::{run_query, Query, QueryOutput};
use crate::error::{AutomationError, AutomationResult};
use crate::traits::automation::{Browser, PageAutomation};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Opens [`HttpPage`]s sharing one connection pool.
#[derive(Clone)]
pub struct HttpBrowser {
    client: reqwest::Client,
    settle_delay: Duration,
    timeout: Duration,
}

impl HttpBrowser {
    /// Create a browser with a 30s navigation budget and a 3s settle delay.
    pub fn new() -> AutomationResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(AutomationError::Client)?;

        Ok(Self {
            client,
            settle_delay: Duration::from_secs(3),
            timeout: Duration::from_secs(30),
        })
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Pause after each load, for pages that keep updating after the response.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Budget for a single navigation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    type Page = HttpPage;

    async fn open_page(&self) -> AutomationResult<HttpPage> {
        Ok(HttpPage {
            client: self.client.clone(),
            settle_delay: self.settle_delay,
            timeout: self.timeout,
            current: RwLock::new(None),
        })
    }
}

struct LoadedPage {
    url: Url,
    html: String,
}

/// A single page whose current document is the last fetched response.
pub struct HttpPage {
    client: reqwest::Client,
    settle_delay: Duration,
    timeout: Duration,
    current: RwLock<Option<LoadedPage>>,
}

impl HttpPage {
    async fn fetch(&self, url: &Url) -> AutomationResult<LoadedPage> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AutomationError::Navigation {
                url: url.to_string(),
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AutomationError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Links resolve against the final URL after redirects
        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| AutomationError::Navigation {
                url: url.to_string(),
                source: Box::new(e),
            })?;

        Ok(LoadedPage {
            url: final_url,
            html,
        })
    }

    fn with_current<T>(&self, f: impl FnOnce(&LoadedPage) -> AutomationResult<T>) -> AutomationResult<T> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        let page = guard.as_ref().ok_or(AutomationError::NoPage)?;
        f(page)
    }
}

#[async_trait]
impl PageAutomation for HttpPage {
    async fn navigate(&self, url: &str) -> AutomationResult<()> {
        let parsed = Url::parse(url).map_err(|_| AutomationError::InvalidUrl {
            url: url.to_string(),
        })?;

        debug!(url = %url, "Navigating");
        let page = tokio::time::timeout(self.timeout, self.fetch(&parsed))
            .await
            .map_err(|_| AutomationError::Timeout {
                url: url.to_string(),
            })??;

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(page);

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        Ok(())
    }

    async fn current_url(&self) -> Option<String> {
        self.with_current(|page| Ok(page.url.to_string())).ok()
    }

    async fn evaluate(&self, query: &Query) -> AutomationResult<QueryOutput> {
        self.with_current(|page| run_query(&page.html, &page.url, query))
    }

    async fn click(&self, selector: &str, index: usize) -> AutomationResult<()> {
        let controls = self.controls(selector).await?;
        let control = controls
            .into_iter()
            .find(|c| c.index == index)
            .ok_or_else(|| AutomationError::NoSuchElement {
                selector: selector.to_string(),
                index,
            })?;

        match control.href {
            Some(href) => self.navigate(&href).await,
            None => {
                warn!(tag = %control.tag, text = %control.text, "Control has no target to follow");
                Err(AutomationError::Unsupported(format!(
                    "activating <{}> needs a script-capable backend",
                    control.tag
                )))
            }
        }
    }

    async fn screenshot(&self, path: &Path) -> AutomationResult<()> {
        let html = self.with_current(|page| Ok(page.html.clone()))?;
        tokio::fs::write(path.with_extension("html"), html).await?;
        Ok(())
    }

    async fn close(&self) -> AutomationResult<()> {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_evaluate_before_navigate_fails() {
        let browser = HttpBrowser::new().unwrap();
        let page = browser.open_page().await.unwrap();

        let err = page.evaluate(&Query::links("a")).await.unwrap_err();
        assert!(matches!(err, AutomationError::NoPage));
        assert_eq!(page.current_url().await, None);
    }

    #[tokio::test]
    async fn test_navigate_rejects_invalid_url() {
        let browser = HttpBrowser::new().unwrap();
        let page = browser.open_page().await.unwrap();

        let err = page.navigate("not a url").await.unwrap_err();
        assert!(matches!(err, AutomationError::InvalidUrl { .. }));
    }
}
