// Hall Data Scraper - API Core
//
// Serves the dedama boundary API over HTTP. Scraping, aggregation and the
// cache live in the dedama crate; this crate wires them to routes.

pub mod config;
pub mod server;

pub use config::*;
