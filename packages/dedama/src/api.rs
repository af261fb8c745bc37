//! Transport-agnostic boundary between the scraper and a serving layer.
//!
//! Every operation returns a well-formed response value. Emptiness is carried
//! by empty collections and a `message`, never by an error.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::aggregate::{analyze, overview, time_series, top_units};
use crate::coordinator::ScrapeCoordinator;
use crate::store::Store;
use crate::traits::automation::Browser;
use crate::types::record::GroupDataset;
use crate::types::stats::{GroupStats, Overview, RankedUnit, TimeSeriesPoint};

/// Message returned by read endpoints before any data has been committed.
pub const NO_DATA_MESSAGE: &str = "No data available. Please scrape first.";

/// Units listed in an overview.
pub const TOP_UNITS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResponse {
    pub success: bool,
    pub data: Vec<GroupDataset>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataResponse {
    pub success: bool,
    pub data: Vec<GroupDataset>,
    pub last_updated: Option<DateTime<Utc>>,
    pub scrape_in_progress: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<IndexMap<String, GroupStats>>,
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<Overview>,
    #[serde(default)]
    pub top_units: Vec<RankedUnit>,
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesResponse {
    pub success: bool,
    pub group: String,
    #[serde(default)]
    pub series: Vec<TimeSeriesPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Runs scrapes into a shared [`Store`] and answers reads from it.
pub struct ScrapeService<B: Browser> {
    coordinator: ScrapeCoordinator<B>,
    store: Arc<Store>,
}

impl<B: Browser> ScrapeService<B> {
    pub fn new(coordinator: ScrapeCoordinator<B>, store: Arc<Store>) -> Self {
        Self { coordinator, store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn coordinator(&self) -> &ScrapeCoordinator<B> {
        &self.coordinator
    }

    /// Run a scrape to completion and return what it found.
    ///
    /// While another run holds the gate this starts nothing and returns the
    /// cached dataset and timestamp unchanged. A run that finds nothing is
    /// only committed when `replace_on_empty` is set.
    pub async fn trigger_scrape(&self) -> ScrapeResponse {
        let Some(guard) = self.store.begin_run() else {
            info!("Scrape already in progress, returning cached data");
            let snapshot = self.store.read();
            return ScrapeResponse {
                success: true,
                data: snapshot.datasets.clone(),
                last_updated: snapshot.last_updated,
            };
        };

        let config = self.coordinator.config();
        let datasets = self.coordinator.run(&config.entry_url).await;

        if !datasets.is_empty() || config.replace_on_empty {
            guard.commit(datasets.clone(), Utc::now());
        } else {
            warn!("Scrape produced no data, keeping previous dataset");
        }
        drop(guard);

        ScrapeResponse {
            success: true,
            data: datasets,
            last_updated: self.store.read().last_updated,
        }
    }

    pub fn cached_data(&self) -> DataResponse {
        let snapshot = self.store.read();
        DataResponse {
            success: true,
            data: snapshot.datasets.clone(),
            last_updated: snapshot.last_updated,
            scrape_in_progress: self.store.in_progress(),
        }
    }

    pub fn analysis(&self) -> AnalysisResponse {
        let snapshot = self.store.read();
        if snapshot.is_empty() {
            return AnalysisResponse {
                success: false,
                analysis: None,
                last_updated: snapshot.last_updated,
                message: Some(NO_DATA_MESSAGE.to_string()),
            };
        }

        AnalysisResponse {
            success: true,
            analysis: Some(analyze(&snapshot.datasets)),
            last_updated: snapshot.last_updated,
            message: None,
        }
    }

    pub fn overview(&self) -> OverviewResponse {
        let snapshot = self.store.read();
        if snapshot.is_empty() {
            return OverviewResponse {
                success: false,
                overview: None,
                top_units: Vec::new(),
                last_updated: snapshot.last_updated,
                message: Some(NO_DATA_MESSAGE.to_string()),
            };
        }

        let stats = analyze(&snapshot.datasets);
        OverviewResponse {
            success: true,
            overview: Some(overview(&stats)),
            top_units: top_units(&stats, TOP_UNITS),
            last_updated: snapshot.last_updated,
            message: None,
        }
    }

    /// Per-date totals for one group, matched by exact name.
    pub fn time_series(&self, group: &str) -> SeriesResponse {
        let snapshot = self.store.read();
        let found = snapshot.datasets.iter().rev().find(|d| d.name == group);

        match found {
            Some(dataset) => SeriesResponse {
                success: true,
                group: group.to_string(),
                series: time_series(dataset),
                message: None,
            },
            None => SeriesResponse {
                success: false,
                group: group.to_string(),
                series: Vec::new(),
                message: Some(if snapshot.is_empty() {
                    NO_DATA_MESSAGE.to_string()
                } else {
                    format!("No group named {group:?}")
                }),
            },
        }
    }
}
