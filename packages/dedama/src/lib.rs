//! Hall Data Scraping Library
//!
//! Drives one browsing session from a hall's entry page to its per-model data
//! tables, reads every unit row it can find, and folds the rows into
//! per-group statistics for a reporting layer.
//!
//! # Design
//!
//! - The page backend is a trait ([`PageAutomation`]), so navigation and
//!   extraction run the same against [`HttpBrowser`] or [`testing::FakeBrowser`]
//! - Discovery is an ordered cascade that stops at the first strategy with
//!   results; strategies are never merged
//! - Failures degrade to smaller or empty results at the narrowest step
//! - Whole runs are serialised by the [`Store`] gate; reads never wait
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dedama::{HttpBrowser, ScrapeConfig, ScrapeCoordinator, ScrapeService, Store};
//!
//! let coordinator = ScrapeCoordinator::new(HttpBrowser::new()?, ScrapeConfig::default());
//! let service = ScrapeService::new(coordinator, Arc::new(Store::new()));
//!
//! let scraped = service.trigger_scrape().await;
//! let analysis = service.analysis();
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Page automation capability
//! - [`automation`] - HTTP backend and the structural query evaluator
//! - [`extract`] - Candidate discovery and table reading
//! - [`navigate`] - Page-state machine
//! - [`aggregate`] - Statistics over scraped records
//! - [`coordinator`] - One scrape run end to end
//! - [`store`] - Latest dataset and the run gate
//! - [`api`] - Responses for a serving layer
//! - [`testing`] - In-memory site for tests

pub mod aggregate;
pub mod api;
pub mod automation;
pub mod coordinator;
pub mod error;
pub mod extract;
pub mod navigate;
pub mod report;
pub mod store;
pub mod testing;
pub mod traits;
pub mod types;

pub use error::{AutomationError, AutomationResult, ScrapeError, ScrapeResult};
pub use traits::automation::{Browser, PageAutomation};
pub use types::{
    config::{DiscoveryStrategy, LabelPattern, NavigatorConfig, ScrapeConfig, SelectorSpec, TableSpec},
    record::{parse_count, Candidate, DateEntry, GroupDataset, UnitRecord},
    stats::{GroupStats, Overview, RankedUnit, TimeSeriesPoint, UnitSummary},
};

pub use aggregate::{analyze, group_stats, overview, time_series, top_units};
pub use api::{
    AnalysisResponse, DataResponse, OverviewResponse, ScrapeResponse, ScrapeService, SeriesResponse,
};
pub use automation::{HttpBrowser, HttpPage, Query, QueryOutput};
pub use coordinator::ScrapeCoordinator;
pub use extract::Extractor;
pub use navigate::{Discovery, NavState, Navigator};
pub use report::SiteReport;
pub use store::{RunGuard, Snapshot, Store};
