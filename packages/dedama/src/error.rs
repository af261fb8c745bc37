//! Typed errors for the scraping library.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Most of these never
//! reach a caller of [`crate::ScrapeService`]: they are caught at the
//! narrowest enclosing step (date, unit, run) and degrade to an empty result.

use thiserror::Error;

/// Errors raised by a page automation backend.
#[derive(Debug, Error)]
pub enum AutomationError {
    /// Navigation did not produce a usable document
    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Document did not reach quiescence within the budget
    #[error("timeout loading: {url}")]
    Timeout { url: String },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// A structural query used a selector the parser rejects
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// A query was evaluated before any page was loaded
    #[error("no page loaded")]
    NoPage,

    /// Query returned a different shape than the caller asked for
    #[error("unexpected query output: expected {expected}")]
    UnexpectedOutput { expected: &'static str },

    /// The backend cannot perform this action
    #[error("unsupported action: {0}")]
    Unsupported(String),

    /// Click target index is out of range
    #[error("no element {index} for selector {selector:?}")]
    NoSuchElement { selector: String, index: usize },

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    /// Writing a snapshot or report failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that abort a whole scrape run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Automation step failed
    #[error("automation failed: {0}")]
    Automation(#[from] AutomationError),

    /// The automation session could not be opened
    #[error("automation session unavailable: {0}")]
    SessionUnavailable(String),
}

/// Result type alias for automation operations.
pub type AutomationResult<T> = std::result::Result<T, AutomationError>;

/// Result type alias for scrape operations.
pub type ScrapeResult<T> = std::result::Result<T, ScrapeError>;
