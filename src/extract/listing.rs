//! Listing page extraction: program cards and the pagination control

use crate::extract::{element_text, resolve_link, selector, ProgramLink};
use scraper::{ElementRef, Html};
use url::Url;

const CARD_SELECTOR: &str = "div.card--fundingprogram";
const LABEL_SELECTOR: &str = "span.link--label";
const PAGINATION_SELECTOR: &str = "div.pagination";
const FORWARD_SELECTOR: &str = "a.forward.button[href]";

/// Extracts the program cards of a listing page in document order
///
/// A card contributes a link only when it has both a resolvable href (taken
/// from its first unclassed anchor) and a non-empty label.
///
/// # Example
///
/// ```
/// use funding_crawler::extract::extract_listing_links;
/// use url::Url;
///
/// let html = r#"<div class="card--fundingprogram">
///     <a href="/p/one.html"><span class="link--label">One</span></a>
/// </div>"#;
/// let base = Url::parse("https://funding.example.org").unwrap();
/// let links = extract_listing_links(html, &base);
/// assert_eq!(links[0].url, "https://funding.example.org/p/one.html");
/// assert_eq!(links[0].name, "One");
/// ```
pub fn extract_listing_links(html: &str, base_url: &Url) -> Vec<ProgramLink> {
    let document = Html::parse_document(html);
    let Some(card_selector) = selector(CARD_SELECTOR) else {
        return Vec::new();
    };

    let mut programs = Vec::new();
    for card in document.select(&card_selector) {
        match read_card(card, base_url) {
            Some(link) => programs.push(link),
            None => tracing::debug!("Skipping program card without link or label"),
        }
    }

    tracing::info!("Extracted {} program links from the page", programs.len());
    programs
}

fn read_card(card: ElementRef<'_>, base_url: &Url) -> Option<ProgramLink> {
    let anchor_selector = selector("a")?;
    let anchor = card.select(&anchor_selector).find(|a| {
        a.value()
            .attr("class")
            .map_or(true, |class| class.trim().is_empty())
    })?;

    let url = anchor
        .value()
        .attr("href")
        .and_then(|href| resolve_link(href, base_url))?;

    let label_selector = selector(LABEL_SELECTOR)?;
    let name = anchor
        .select(&label_selector)
        .next()
        .map(element_text)
        .filter(|name| !name.is_empty())?;

    Some(ProgramLink { url, name })
}

/// Finds the forward link of the pagination control
///
/// Returns None when there is no pagination control or it has no forward
/// action, which marks the last page of results.
pub fn extract_next_page_url(html: &str, base_url: &Url) -> Option<String> {
    let document = Html::parse_document(html);
    let pagination_selector = selector(PAGINATION_SELECTOR)?;
    let forward_selector = selector(FORWARD_SELECTOR)?;

    let next = document
        .select(&pagination_selector)
        .next()
        .and_then(|pagination| pagination.select(&forward_selector).next())
        .and_then(|forward| forward.value().attr("href"))
        .and_then(|href| resolve_link(href, base_url));

    match &next {
        Some(url) => tracing::info!("Found next page URL: {}", url),
        None => tracing::info!("No next page found"),
    }

    next
}
