//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates:
//! - Walking the listing pages
//! - Upserting discovered programs
//! - Rendering and extracting detail pages of unscraped programs
//! - Persisting details together with the scraped flag
//!
//! Failures are contained per unit: a program that fails is logged and left
//! unscraped, a listing page that fails ends the walk. Neither aborts the run.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{build_http_client, HttpFetcher, PageFetcher, SiteFetcher};
use crate::crawler::pagination::ListingWalker;
use crate::crawler::renderer::Renderer;
use crate::extract::{extract_detail_fields, ProgramLink};
use crate::storage::{open_store, DetailsWrite, ProgramDetails, ProgramStore, SqliteStore};
use crate::FundingError;
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};
use url::Url;

/// How the listing walk ended
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CrawlEnd {
    /// The last page had no forward link
    #[default]
    Exhausted,
    /// A listing page could not be fetched
    ListingFailed { url: String },
}

/// Counters for one crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub listing_pages: u32,
    pub discovered: u32,
    pub created: u32,
    pub skipped: u32,
    pub details_created: u32,
    pub details_updated: u32,
    pub failed: u32,
    pub end: CrawlEnd,
}

impl CrawlStats {
    /// Programs whose details were written during this crawl
    pub fn scraped(&self) -> u32 {
        self.details_created + self.details_updated
    }
}

impl fmt::Display for CrawlStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} listing pages, {} programs seen ({} new), {} scraped ({} updated), {} already scraped, {} failed",
            self.listing_pages,
            self.discovered,
            self.created,
            self.scraped(),
            self.details_updated,
            self.skipped,
            self.failed
        )
    }
}

/// Main crawler coordinator structure
pub struct Coordinator<F, S> {
    config: CrawlerConfig,
    base_url: Url,
    fetcher: F,
    store: S,
}

impl<F: PageFetcher, S: ProgramStore> Coordinator<F, S> {
    pub fn new(config: CrawlerConfig, base_url: Url, fetcher: F, store: S) -> Self {
        Self {
            config,
            base_url,
            fetcher,
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Hands back the fetcher and store, e.g. to shut the fetcher down
    pub fn into_parts(self) -> (F, S) {
        (self.fetcher, self.store)
    }

    /// Runs the main crawl loop
    ///
    /// Listing pages are visited strictly in sequence, and the programs of a
    /// page are processed in the order they appear. The configured delay is
    /// applied between two listing pages, never after the last one.
    pub async fn run(&mut self) -> CrawlStats {
        tracing::info!("Starting crawl at {}", self.config.start_url);

        let start_time = Instant::now();
        let delay = Duration::from_millis(self.config.page_delay_ms);
        let mut stats = CrawlStats::default();
        let mut walker = ListingWalker::new(self.config.start_url.clone(), self.base_url.clone());

        while let Some(result) = walker.next_page(&self.fetcher).await {
            let page = match result {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!("Error fetching listing page: {}", e);
                    stats.end = CrawlEnd::ListingFailed {
                        url: e.url().to_string(),
                    };
                    break;
                }
            };
            stats.listing_pages += 1;

            for link in &page.programs {
                stats.discovered += 1;
                if let Err(e) = self.process_program(link, &mut stats).await {
                    tracing::error!("Error scraping program {}: {}", link.name, e);
                    stats.failed += 1;
                }
            }

            tracing::info!(
                "Progress: {} listing pages, {} programs seen, {} scraped, {:.1}s elapsed",
                stats.listing_pages,
                stats.discovered,
                stats.scraped(),
                start_time.elapsed().as_secs_f64()
            );

            if page.next_page.is_some() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        match &stats.end {
            CrawlEnd::Exhausted => tracing::info!("No more listing pages, crawl complete"),
            CrawlEnd::ListingFailed { url } => {
                tracing::warn!("Crawl stopped early at listing page {}", url)
            }
        }
        tracing::info!("Crawl finished: {}", stats);
        stats
    }

    /// Upserts one program and scrapes it unless it was scraped before
    async fn process_program(
        &mut self,
        link: &ProgramLink,
        stats: &mut CrawlStats,
    ) -> Result<(), FundingError> {
        let program = match self.store.find_program_by_url(&link.url)? {
            Some(program) => program,
            None => {
                let program = self.store.create_program(&link.url, &link.name)?;
                tracing::info!("Added new program: {}", program.name);
                stats.created += 1;
                program
            }
        };

        if program.is_scraped {
            tracing::info!("Program already scraped: {}", program.name);
            stats.skipped += 1;
            return Ok(());
        }

        tracing::info!("Scraping details for: {}", program.name);
        let markup = self.fetcher.fetch_rendered(&program.url).await?;
        let fields = extract_detail_fields(&markup);
        if fields.title.is_empty() {
            tracing::debug!("Detail page of {} has no title", program.url);
        }

        let details = ProgramDetails::from(&fields);
        let write = self.store.save_scrape(program.id, &details)?;
        match write {
            DetailsWrite::Created => stats.details_created += 1,
            DetailsWrite::Updated => stats.details_updated += 1,
        }
        tracing::info!("Details {} for: {}", write.as_str(), program.name);
        Ok(())
    }
}

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the program database
/// 2. Build the HTTP client and, if enabled, launch the browser
/// 3. Walk the listing and scrape every new program
/// 4. Shut the browser down
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlStats)` - Crawl ran; per-page failures are counted in the stats
/// * `Err(FundingError)` - A resource needed for the crawl could not be set up
pub async fn run_crawl(config: &Config) -> Result<CrawlStats, FundingError> {
    let base_url = Url::parse(&config.crawler.base_url)?;
    let store = open_store(Path::new(&config.output.database_path))?;
    let client = build_http_client(&config.user_agent, config.crawler.request_timeout_secs)?;
    let http = HttpFetcher::new(client);

    if config.renderer.enabled {
        let renderer = Renderer::launch(&config.renderer).await?;
        Ok(crawl_with(config, base_url, SiteFetcher::new(http, renderer), store).await)
    } else {
        tracing::warn!("Renderer disabled, detail pages are fetched without running scripts");
        Ok(crawl_with(config, base_url, http, store).await)
    }
}

async fn crawl_with<F: PageFetcher>(
    config: &Config,
    base_url: Url,
    fetcher: F,
    store: SqliteStore,
) -> CrawlStats {
    let mut coordinator = Coordinator::new(config.crawler.clone(), base_url, fetcher, store);
    let stats = coordinator.run().await;
    let (fetcher, _store) = coordinator.into_parts();
    fetcher.shutdown().await;
    stats
}
