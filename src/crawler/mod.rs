//! Crawler module for walking the listing and scraping program details
//!
//! This module contains the core crawling logic, including:
//! - Static HTTP fetching and headless browser rendering
//! - Listing pagination
//! - Overall crawl coordination
//! - Weekly scheduling

mod coordinator;
mod fetcher;
mod pagination;
mod renderer;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator, CrawlEnd, CrawlStats};
pub use fetcher::{build_http_client, fetch_url, HttpFetcher, PageFetcher, SiteFetcher};
pub use pagination::{ListingPage, ListingWalker};
pub use renderer::Renderer;
pub use scheduler::{run_weekly, WeeklyAnchor};
