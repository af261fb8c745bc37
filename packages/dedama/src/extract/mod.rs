//! Multi-strategy extraction over the current page.
//!
//! - Discovery runs a [`SelectorSpec`] cascade and stops at the first
//!   strategy that yields a candidate. Results are never merged across
//!   strategies.
//! - Table reading scans every matching table and row, keeping rows that
//!   pass [`is_data_row`].

pub mod candidates;
pub mod table;

pub use candidates::filter_candidates;
pub use table::{is_data_row, parse_rows, parse_tables, table_group_name, UNKNOWN_GROUP};

use tracing::{debug, info};

use crate::error::AutomationResult;
use crate::traits::automation::PageAutomation;
use crate::types::config::{SelectorSpec, TableSpec};
use crate::types::record::{Candidate, DateEntry, GroupDataset, UnitRecord};

/// Reads candidates and tables from whatever page `page` currently shows.
pub struct Extractor<'a, P: PageAutomation + ?Sized> {
    page: &'a P,
}

impl<'a, P: PageAutomation + ?Sized> Extractor<'a, P> {
    pub fn new(page: &'a P) -> Self {
        Self { page }
    }

    /// Run the discovery cascade. An empty result is not an error.
    pub async fn discover_candidates(&self, spec: &SelectorSpec) -> AutomationResult<Vec<Candidate>> {
        for strategy in &spec.strategies {
            let links = self.page.links(&strategy.selector).await?;
            let matched = links.len();
            let candidates = filter_candidates(links, strategy, spec);

            debug!(
                strategy = %strategy.name,
                matched,
                kept = candidates.len(),
                "Discovery strategy evaluated"
            );

            if !candidates.is_empty() {
                info!(
                    strategy = %strategy.name,
                    count = candidates.len(),
                    "Discovered candidates"
                );
                return Ok(candidates);
            }
        }

        debug!("No discovery strategy yielded candidates");
        Ok(Vec::new())
    }

    /// Every data row on the page, across all tables.
    pub async fn read_table(&self, spec: &TableSpec) -> AutomationResult<Vec<UnitRecord>> {
        let tables = self
            .page
            .tables(&spec.table_selector, &spec.row_selector, &spec.cell_selector)
            .await?;
        let records = parse_tables(&tables, spec.min_columns);

        debug!(tables = tables.len(), rows = records.len(), "Read data tables");
        Ok(records)
    }

    /// One dataset per table holding data rows, for pages that show data
    /// without links to per-group pages.
    pub async fn read_direct(
        &self,
        spec: &TableSpec,
        date_label: &str,
    ) -> AutomationResult<Vec<GroupDataset>> {
        let tables = self
            .page
            .tables(&spec.table_selector, &spec.row_selector, &spec.cell_selector)
            .await?;
        let url = self.page.current_url().await.unwrap_or_default();

        let datasets: Vec<_> = tables
            .iter()
            .filter_map(|table| {
                let records = parse_rows(&table.rows, spec.min_columns);
                if records.is_empty() {
                    return None;
                }
                Some(GroupDataset::new(
                    table_group_name(table.heading.as_deref()),
                    url.clone(),
                    vec![DateEntry::new(date_label, records)],
                ))
            })
            .collect();

        info!(datasets = datasets.len(), "Direct table extraction finished");
        Ok(datasets)
    }
}
