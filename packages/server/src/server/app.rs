use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Router,
};
use dedama::{Browser, ScrapeService};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::server::routes::{
    analyze_handler, data_handler, health_handler, overview_handler, scrape_handler,
    series_handler,
};

/// Shared state: the one scrape service for this process.
pub type AppState<B> = Arc<ScrapeService<B>>;

/// Build the Axum application router
///
/// Generic over the page backend so tests can serve a fake site.
pub fn build_app<B>(service: AppState<B>) -> Router
where
    B: Browser + 'static,
{
    // CORS configuration - allow any origin, the dashboard is served separately
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/api/scrape", get(scrape_handler::<B>).post(scrape_handler::<B>))
        .route("/api/data", get(data_handler::<B>))
        .route("/api/analyze", get(analyze_handler::<B>))
        .route("/api/overview", get(overview_handler::<B>))
        .route("/api/series/:group", get(series_handler::<B>))
        .route("/health", get(health_handler::<B>))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
