//! Funding-Crawler: a funding program directory harvester
//!
//! This crate walks the paginated search results of a public funding program
//! directory, renders every program's detail page, extracts its structured
//! fields and stores them in SQLite. Programs are scraped once: a program that
//! is already marked as scraped is never fetched again.

pub mod admin;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod logging;
pub mod storage;

use thiserror::Error;

/// Main error type for Funding-Crawler operations
#[derive(Debug, Error)]
pub enum FundingError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Browser protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while fetching a single page
///
/// Every variant carries the URL that failed so the caller can log it without
/// extra bookkeeping.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Network error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("Render error for {url}: {message}")]
    Render { url: String, message: String },

    #[error("Timed out waiting for {url}")]
    Timeout { url: String },
}

impl FetchError {
    /// The URL whose fetch failed
    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. }
            | Self::Network { url, .. }
            | Self::Render { url, .. }
            | Self::Timeout { url } => url,
        }
    }
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, CrawlStats};
pub use extract::{DetailFields, ProgramLink};
pub use storage::{ProgramDetails, ProgramRecord, ProgramStore, SqliteStore};
