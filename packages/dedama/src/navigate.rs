//! Page-state machine that walks a session from the entry page to data tables.
//!
//! ```text
//! Home --search control--> SearchEntry --(in place)--> ResultsList
//! ResultsList --candidate--> UnitDetail --date tab--> DateDetail (repeatable)
//! ```
//!
//! Nothing here aborts a run on its own: a missing search control leaves the
//! machine at `Home`, and errors below a unit are logged and skipped.

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::automation::query::Control;
use crate::error::AutomationResult;
use crate::extract::Extractor;
use crate::traits::automation::PageAutomation;
use crate::types::config::NavigatorConfig;
use crate::types::record::{Candidate, DateEntry, GroupDataset, UnitRecord};

/// Where the session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavState {
    Home,
    SearchEntry,
    ResultsList,
    UnitDetail,
    DateDetail,
}

/// Outcome of group discovery.
#[derive(Debug, Clone, PartialEq)]
pub enum Discovery {
    /// Links to per-group pages.
    Candidates(Vec<Candidate>),

    /// No links, but the page itself held data tables.
    Direct(Vec<GroupDataset>),

    /// Every page and strategy came up empty.
    Empty,
}

pub struct Navigator<'a, P: PageAutomation + ?Sized> {
    page: &'a P,
    config: &'a NavigatorConfig,
    state: NavState,
    today_label: String,
}

impl<'a, P: PageAutomation + ?Sized> Navigator<'a, P> {
    pub fn new(page: &'a P, config: &'a NavigatorConfig) -> Self {
        let today_label = config
            .today_label
            .clone()
            .unwrap_or_else(|| Local::now().format("%Y/%m/%d").to_string());

        Self {
            page,
            config,
            state: NavState::Home,
            today_label,
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    /// Label given to the table found on a unit's landing page.
    pub fn today_label(&self) -> &str {
        &self.today_label
    }

    fn transition(&mut self, to: NavState) {
        if self.state != to {
            debug!(from = ?self.state, to = ?to, "Navigator transition");
        }
        self.state = to;
    }

    /// Try to activate the search control on the current page.
    ///
    /// Returns false, staying at `Home`, when no control matches or the
    /// activation fails.
    pub async fn enter_search(&mut self) -> bool {
        let controls = match self.page.controls(&self.config.control_selector).await {
            Ok(controls) => controls,
            Err(e) => {
                warn!(error = %e, "Could not list controls");
                return false;
            }
        };

        let Some(control) = find_search_control(
            &controls,
            &self.config.search_labels,
            &self.config.topic_keywords,
        ) else {
            info!("No search control found, staying at home page");
            return false;
        };

        info!(text = %control.text, "Activating search control");
        match self
            .page
            .click(&self.config.control_selector, control.index)
            .await
        {
            Ok(()) => {
                self.transition(NavState::SearchEntry);
                // The listing replaces the search page in place
                self.transition(NavState::ResultsList);
                true
            }
            Err(e) => {
                warn!(error = %e, text = %control.text, "Search control activation failed");
                false
            }
        }
    }

    /// Find groups starting from the current page, then each fallback entry point.
    pub async fn discover_groups(&mut self) -> Discovery {
        self.enter_search().await;
        if let Some(found) = self.discover_here().await {
            return found;
        }

        let config = self.config;
        for url in &config.fallback_entry_points {
            info!(url = %url, "Trying fallback entry point");
            if let Err(e) = self.page.navigate(url).await {
                warn!(url = %url, error = %e, "Fallback entry point failed to load");
                continue;
            }
            self.transition(NavState::Home);

            self.enter_search().await;
            if let Some(found) = self.discover_here().await {
                return found;
            }
        }

        warn!("Discovery exhausted every entry point");
        Discovery::Empty
    }

    async fn discover_here(&mut self) -> Option<Discovery> {
        let extractor = Extractor::new(self.page);

        match extractor.discover_candidates(&self.config.groups).await {
            Ok(candidates) if !candidates.is_empty() => {
                self.transition(NavState::ResultsList);
                return Some(Discovery::Candidates(candidates));
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Group discovery failed on this page"),
        }

        info!("No group links, attempting direct table extraction");
        match extractor
            .read_direct(&self.config.table, &self.today_label)
            .await
        {
            Ok(datasets) if !datasets.is_empty() => Some(Discovery::Direct(datasets)),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Direct extraction failed");
                None
            }
        }
    }

    /// Visit one group's page and its date tabs.
    ///
    /// Errors loading or reading the group page itself propagate; failures on
    /// individual date pages are logged and skipped. `Ok(None)` means the
    /// group had no data rows anywhere.
    pub async fn collect_group(&mut self, candidate: &Candidate) -> AutomationResult<Option<GroupDataset>> {
        self.page.navigate(&candidate.target).await?;
        self.transition(NavState::UnitDetail);

        let extractor = Extractor::new(self.page);
        let mut dates = Vec::new();

        let landing = extractor.read_table(&self.config.table).await?;
        if !landing.is_empty() {
            dates.push(DateEntry::new(self.today_label.clone(), landing));
        }

        let here = self.page.current_url().await;
        let date_links = match extractor.discover_candidates(&self.config.dates).await {
            Ok(links) => links,
            Err(e) => {
                warn!(group = %candidate.label, error = %e, "Date discovery failed");
                Vec::new()
            }
        };

        for date in date_links
            .iter()
            .filter(|d| {
                !same_document(&d.target, &candidate.target)
                    && !here.as_deref().is_some_and(|h| same_document(&d.target, h))
            })
            .take(self.config.max_dates)
        {
            match self.read_date(date).await {
                Ok(records) if !records.is_empty() => {
                    dates.push(DateEntry::new(date.label.clone(), records));
                }
                Ok(_) => debug!(group = %candidate.label, date = %date.label, "No rows for date"),
                Err(e) => warn!(
                    group = %candidate.label,
                    date = %date.label,
                    error = %e,
                    "Skipping date"
                ),
            }
        }

        if dates.is_empty() {
            return Ok(None);
        }

        info!(group = %candidate.label, dates = dates.len(), "Collected group");
        Ok(Some(GroupDataset::new(
            candidate.label.clone(),
            candidate.target.clone(),
            dates,
        )))
    }

    async fn read_date(&mut self, date: &Candidate) -> AutomationResult<Vec<UnitRecord>> {
        self.page.navigate(&date.target).await?;
        self.transition(NavState::DateDetail);
        Extractor::new(self.page).read_table(&self.config.table).await
    }
}

/// True when both URLs name the same document, ignoring any fragment.
pub fn same_document(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(mut a), Ok(mut b)) => {
            a.set_fragment(None);
            b.set_fragment(None);
            a == b
        }
        _ => a == b,
    }
}

/// Pick the control that leads to the search/data listing.
///
/// Tiers, each scanned label by label: exact text match, then substring
/// match, then any control whose text contains a topic keyword.
pub fn find_search_control<'c>(
    controls: &'c [Control],
    labels: &[String],
    keywords: &[String],
) -> Option<&'c Control> {
    let text = |c: &Control| c.text.trim().to_string();

    labels
        .iter()
        .find_map(|label| controls.iter().find(|c| text(c) == *label))
        .or_else(|| {
            labels
                .iter()
                .find_map(|label| controls.iter().find(|c| text(c).contains(label.as_str())))
        })
        .or_else(|| {
            controls
                .iter()
                .find(|c| keywords.iter().any(|k| text(c).contains(k.as_str())))
        })
}
