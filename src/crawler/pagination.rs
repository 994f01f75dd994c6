//! Listing pagination
//!
//! Walks the search result listing one page at a time by following the
//! "forward" link. A page without one ends the walk, and so does a page that
//! fails to load.

use crate::crawler::fetcher::PageFetcher;
use crate::extract::{extract_listing_links, extract_next_page_url, ProgramLink};
use crate::FetchError;
use url::Url;

/// One fetched listing page
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    pub url: String,
    pub programs: Vec<ProgramLink>,
    pub next_page: Option<String>,
}

/// Cursor over the listing pages of one crawl
#[derive(Debug, Clone)]
pub struct ListingWalker {
    base_url: Url,
    current: Option<String>,
    pages_fetched: u32,
}

impl ListingWalker {
    pub fn new(start_url: impl Into<String>, base_url: Url) -> Self {
        Self {
            base_url,
            current: Some(start_url.into()),
            pages_fetched: 0,
        }
    }

    /// URL the next call to [`ListingWalker::next_page`] will fetch
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.current.is_none()
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Fetches the current page and advances to its successor
    ///
    /// Returns `None` once the walk is over. A fetch error is returned once
    /// and also ends the walk.
    pub async fn next_page<F: PageFetcher>(
        &mut self,
        fetcher: &F,
    ) -> Option<Result<ListingPage, FetchError>> {
        let url = self.current.take()?;
        tracing::info!("Scraping listing page {}: {}", self.pages_fetched + 1, url);

        let markup = match fetcher.fetch_static(&url).await {
            Ok(markup) => markup,
            Err(e) => return Some(Err(e)),
        };
        self.pages_fetched += 1;

        let programs = extract_listing_links(&markup, &self.base_url);
        let next_page = extract_next_page_url(&markup, &self.base_url);
        tracing::debug!(
            "Listing page {} has {} programs, next page: {:?}",
            url,
            programs.len(),
            next_page
        );

        self.current = next_page.clone();
        Some(Ok(ListingPage {
            url,
            programs,
            next_page,
        }))
    }
}
