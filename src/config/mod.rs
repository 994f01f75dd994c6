//! Configuration module for Funding-Crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use funding_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Walk starts at: {}", config.crawler.start_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, RendererConfig, ScheduleConfig, UserAgentConfig,
    DEFAULT_BASE_URL, DEFAULT_START_URL,
};

// Re-export parser functions
pub use parser::{config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{parse_schedule_time, parse_schedule_weekday};
