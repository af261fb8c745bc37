use axum::{
    extract::{Path, State},
    Json,
};
use dedama::{
    AnalysisResponse, Browser, DataResponse, OverviewResponse, ScrapeResponse, SeriesResponse,
};

use crate::server::app::AppState;

/// Run a scrape and wait for it. Returns the cache if one is already running.
pub async fn scrape_handler<B: Browser + 'static>(
    State(service): State<AppState<B>>,
) -> Json<ScrapeResponse> {
    Json(service.trigger_scrape().await)
}

pub async fn data_handler<B: Browser + 'static>(
    State(service): State<AppState<B>>,
) -> Json<DataResponse> {
    Json(service.cached_data())
}

pub async fn analyze_handler<B: Browser + 'static>(
    State(service): State<AppState<B>>,
) -> Json<AnalysisResponse> {
    Json(service.analysis())
}

pub async fn overview_handler<B: Browser + 'static>(
    State(service): State<AppState<B>>,
) -> Json<OverviewResponse> {
    Json(service.overview())
}

pub async fn series_handler<B: Browser + 'static>(
    State(service): State<AppState<B>>,
    Path(group): Path<String>,
) -> Json<SeriesResponse> {
    Json(service.time_series(&group))
}
