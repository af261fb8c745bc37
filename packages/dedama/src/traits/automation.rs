//! Page automation capability.
//!
//! The scraper never touches a rendering engine directly. It drives one
//! logical page through these traits, so the navigator and extractor can be
//! exercised against [`crate::testing::FakeBrowser`] as well as a real backend.

use async_trait::async_trait;
use std::path::Path;

use crate::automation::query::{Control, Link, PageStructure, Query, QueryOutput, TableData};
use crate::error::AutomationResult;

/// One browsing session with a single current document.
#[async_trait]
pub trait PageAutomation: Send + Sync {
    /// Load `url` and resolve once the document is quiescent.
    async fn navigate(&self, url: &str) -> AutomationResult<()>;

    /// URL of the current document, if one is loaded.
    async fn current_url(&self) -> Option<String>;

    /// Run a read-only structural query against the current document.
    async fn evaluate(&self, query: &Query) -> AutomationResult<QueryOutput>;

    /// Activate the `index`-th element matching `selector`.
    async fn click(&self, selector: &str, index: usize) -> AutomationResult<()>;

    /// Capture the current document to `path`.
    async fn screenshot(&self, path: &Path) -> AutomationResult<()>;

    /// Release the session.
    async fn close(&self) -> AutomationResult<()> {
        Ok(())
    }

    async fn links(&self, selector: &str) -> AutomationResult<Vec<Link>> {
        self.evaluate(&Query::links(selector)).await?.into_links()
    }

    async fn controls(&self, selector: &str) -> AutomationResult<Vec<Control>> {
        self.evaluate(&Query::controls(selector)).await?.into_controls()
    }

    async fn tables(&self, table: &str, row: &str, cell: &str) -> AutomationResult<Vec<TableData>> {
        self.evaluate(&Query::tables(table, row, cell))
            .await?
            .into_tables()
    }

    async fn structure(&self, keywords: &[String]) -> AutomationResult<PageStructure> {
        self.evaluate(&Query::Structure {
            keywords: keywords.to_vec(),
        })
        .await?
        .into_structure()
    }
}

/// Launches automation sessions.
#[async_trait]
pub trait Browser: Send + Sync {
    type Page: PageAutomation;

    /// Open a fresh page. Callers close it when the run ends.
    async fn open_page(&self) -> AutomationResult<Self::Page>;
}
