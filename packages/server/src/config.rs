use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use dedama::{NavigatorConfig, ScrapeConfig};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub entry_url: Option<String>,
    pub fallback_urls: Option<Vec<String>>,
    pub max_groups: Option<usize>,
    pub max_dates: Option<usize>,
    pub unit_delay_ms: Option<u64>,
    pub settle_delay_ms: u64,
    pub diagnostics_dir: Option<PathBuf>,
    pub scrape_on_startup: bool,
    pub replace_on_empty: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            entry_url: env::var("SCRAPE_ENTRY_URL").ok(),
            fallback_urls: env::var("SCRAPE_FALLBACK_URLS").ok().map(|v| split_list(&v)),
            max_groups: parse_var("SCRAPE_MAX_GROUPS")?,
            max_dates: parse_var("SCRAPE_MAX_DATES")?,
            unit_delay_ms: parse_var("SCRAPE_UNIT_DELAY_MS")?,
            settle_delay_ms: parse_var("SCRAPE_SETTLE_DELAY_MS")?.unwrap_or(3000),
            diagnostics_dir: env::var("SCRAPE_DIAGNOSTICS_DIR").ok().map(PathBuf::from),
            scrape_on_startup: parse_var("SCRAPE_ON_STARTUP")?.unwrap_or(true),
            replace_on_empty: parse_var("SCRAPE_REPLACE_ON_EMPTY")?.unwrap_or(false),
        })
    }

    /// Scrape settings with environment overrides applied to the defaults.
    pub fn scrape_config(&self) -> ScrapeConfig {
        let mut navigator = NavigatorConfig::default();
        if let Some(urls) = &self.fallback_urls {
            navigator = navigator.with_fallback_entry_points(urls.iter().cloned());
        }
        if let Some(max) = self.max_dates {
            navigator = navigator.with_max_dates(max);
        }

        let mut config = ScrapeConfig::default()
            .with_navigator(navigator)
            .with_replace_on_empty(self.replace_on_empty);
        if let Some(url) = &self.entry_url {
            config = config.with_entry_url(url.clone());
        }
        if let Some(max) = self.max_groups {
            config = config.with_max_groups(max);
        }
        if let Some(ms) = self.unit_delay_ms {
            config = config.with_unit_delay(Duration::from_millis(ms));
        }
        if let Some(dir) = &self.diagnostics_dir {
            config = config.with_diagnostics_dir(dir.clone());
        }
        config
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} has an invalid value: {value:?}")),
        Err(_) => Ok(None),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
