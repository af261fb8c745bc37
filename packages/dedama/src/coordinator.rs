//! One end-to-end scrape run.
//!
//! Opens a single page, walks it with a [`Navigator`], and releases it when
//! the run ends, whether or not it succeeded. A failing group is logged and
//! skipped; a failing run yields an empty list.

use std::path::Path;
use tracing::{error, info, warn};

use crate::error::{ScrapeError, ScrapeResult};
use crate::navigate::{Discovery, Navigator};
use crate::report::SiteReport;
use crate::traits::automation::{Browser, PageAutomation};
use crate::types::config::ScrapeConfig;
use crate::types::record::GroupDataset;

const SNAPSHOT_FILE: &str = "entry-page.png";
const REPORT_FILE: &str = "site-report.json";

pub struct ScrapeCoordinator<B: Browser> {
    browser: B,
    config: ScrapeConfig,
}

impl<B: Browser> ScrapeCoordinator<B> {
    pub fn new(browser: B, config: ScrapeConfig) -> Self {
        Self { browser, config }
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    /// Run from `entry_url`. Any run-level failure is logged and yields an
    /// empty list.
    pub async fn run(&self, entry_url: &str) -> Vec<GroupDataset> {
        match self.try_run(entry_url).await {
            Ok(datasets) => datasets,
            Err(e) => {
                error!(url = %entry_url, error = %e, "Scrape run failed");
                Vec::new()
            }
        }
    }

    /// Like [`run`](Self::run), but surfaces the run-level error.
    pub async fn try_run(&self, entry_url: &str) -> ScrapeResult<Vec<GroupDataset>> {
        let page = self
            .browser
            .open_page()
            .await
            .map_err(|e| ScrapeError::SessionUnavailable(e.to_string()))?;

        let result = self.run_on(&page, entry_url).await;

        if let Err(e) = page.close().await {
            warn!(error = %e, "Failed to close automation session");
        }
        result
    }

    async fn run_on(&self, page: &B::Page, entry_url: &str) -> ScrapeResult<Vec<GroupDataset>> {
        info!(url = %entry_url, max_groups = self.config.max_groups, "Starting scrape run");
        page.navigate(entry_url).await?;

        if let Some(dir) = &self.config.diagnostics_dir {
            write_diagnostics(page, dir).await;
        }

        let mut navigator = Navigator::new(page, &self.config.navigator);
        let candidates = match navigator.discover_groups().await {
            Discovery::Candidates(candidates) => candidates,
            Discovery::Direct(mut datasets) => {
                datasets.truncate(self.config.max_groups);
                info!(groups = datasets.len(), "Scrape run finished from direct tables");
                return Ok(datasets);
            }
            Discovery::Empty => {
                info!("Scrape run found no groups");
                return Ok(Vec::new());
            }
        };

        let total = candidates.len();
        let delay = self.config.unit_delay();
        let mut datasets = Vec::new();

        for (i, candidate) in candidates.iter().take(self.config.max_groups).enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            info!(group = %candidate.label, n = i + 1, total, "Processing group");
            match navigator.collect_group(candidate).await {
                Ok(Some(dataset)) => datasets.push(dataset),
                Ok(None) => info!(group = %candidate.label, "Group had no data"),
                Err(e) => warn!(
                    group = %candidate.label,
                    url = %candidate.target,
                    error = %e,
                    "Skipping group"
                ),
            }
        }

        info!(groups = datasets.len(), discovered = total, "Scrape run finished");
        Ok(datasets)
    }
}

/// Snapshot and structure report of the entry page. Failures only warn.
async fn write_diagnostics<P: PageAutomation + ?Sized>(page: &P, dir: &Path) {
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!(dir = %dir.display(), error = %e, "Cannot create diagnostics directory");
        return;
    }

    if let Err(e) = page.screenshot(&dir.join(SNAPSHOT_FILE)).await {
        warn!(error = %e, "Entry page snapshot failed");
    }

    let report = match SiteReport::capture(page).await {
        Ok(report) => report,
        Err(e) => {
            warn!(error = %e, "Site structure analysis failed");
            return;
        }
    };
    if let Err(e) = report.write_to(&dir.join(REPORT_FILE)).await {
        warn!(error = %e, "Writing site report failed");
    }
}
