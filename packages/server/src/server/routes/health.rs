use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use dedama::Browser;
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: String,
    scrape_in_progress: bool,
    last_updated: Option<DateTime<Utc>>,
    group_count: usize,
}

/// Health check endpoint
///
/// Always 200: a failed or empty scrape is not an unhealthy process.
pub async fn health_handler<B: Browser + 'static>(
    State(service): State<AppState<B>>,
) -> Json<HealthResponse> {
    let snapshot = service.store().read();

    Json(HealthResponse {
        status: "ok".to_string(),
        scrape_in_progress: service.store().in_progress(),
        last_updated: snapshot.last_updated,
        group_count: snapshot.datasets.len(),
    })
}
