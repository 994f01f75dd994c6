//! Field extraction for listing and detail pages
//!
//! Everything in here is a pure function from markup to owned values. Parsed
//! documents never leave this module, so callers can hold the results across
//! await points.
//!
//! Extraction is total: a field that cannot be read degrades to an empty
//! string or list and a warning is logged.

mod detail;
mod listing;

pub use detail::{extract_detail_fields, normalize_label, split_after_colon};
pub use listing::{extract_listing_links, extract_next_page_url};

use scraper::{ElementRef, Selector};
use std::collections::HashMap;
use url::Url;

/// A program card found on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramLink {
    /// Absolute URL of the detail page
    pub url: String,

    /// Display name shown on the card
    pub name: String,
}

/// Text fields recognized on a detail page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    FundingType,
    SupportArea,
    FundingArea,
    Eligibility,
    FundingProviderRaw,
    ProviderName,
    ProviderAddress,
    ProviderPhone,
    ProviderFax,
    ProviderEmail,
    ProviderWebsite,
    ShortSummary,
    AdditionalInformation,
    LegalBasis,
}

impl FieldKey {
    /// Maps a normalized definition-list label to a plain text field
    ///
    /// The contact block and the further-links list are structured and are
    /// handled by [`DetailLabel`] instead.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "förderart" => Some(Self::FundingType),
            "förderbereich" => Some(Self::SupportArea),
            "fördergebiet" => Some(Self::FundingArea),
            "förderberechtigte" => Some(Self::Eligibility),
            "fördergeber" => Some(Self::FundingProviderRaw),
            _ => None,
        }
    }

    /// Tabbed long-text regions in page order
    pub fn for_tab(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::ShortSummary),
            1 => Some(Self::AdditionalInformation),
            2 => Some(Self::LegalBasis),
            _ => None,
        }
    }
}

/// How a definition-list label is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailLabel {
    /// Direct text field
    Text(FieldKey),
    /// Every anchor href inside the value
    FurtherLinks,
    /// Contact block fanning out into six provider fields
    Contact,
    /// Not part of the stored schema
    Unknown,
}

impl DetailLabel {
    pub fn classify(normalized: &str) -> Self {
        match normalized {
            "weiterführende_links" => Self::FurtherLinks,
            "ansprechpunkt" => Self::Contact,
            other => FieldKey::from_label(other)
                .map(Self::Text)
                .unwrap_or(Self::Unknown),
        }
    }
}

/// Everything read from one detail page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailFields {
    /// Page heading; logged, not stored
    pub title: String,

    /// Recognized text fields
    pub text: HashMap<FieldKey, String>,

    /// Outbound links in document order
    pub further_links: Vec<String>,
}

impl DetailFields {
    /// Returns the field value, or an empty string when it was not found
    pub fn get(&self, key: FieldKey) -> String {
        self.text.get(&key).cloned().unwrap_or_default()
    }

    pub(crate) fn set(&mut self, key: FieldKey, value: String) {
        self.text.insert(key, value);
    }
}

/// Parses a CSS selector, logging instead of failing
pub(crate) fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            tracing::warn!("Invalid selector {}: {:?}", css, e);
            None
        }
    }
}

/// Trimmed text of the first element matching `css`, or an empty string
pub(crate) fn select_text(element: ElementRef<'_>, css: &str) -> String {
    selector(css)
        .and_then(|sel| element.select(&sel).next())
        .map(element_text)
        .unwrap_or_default()
}

/// Trimmed attribute of the first element matching `css`, or an empty string
pub(crate) fn select_attr(element: ElementRef<'_>, css: &str, attr: &str) -> String {
    selector(css)
        .and_then(|sel| element.select(&sel).next())
        .and_then(|found| found.value().attr(attr))
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

/// All text below `element`, concatenated and trimmed
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Resolves a link href against the site origin
///
/// Returns None for empty hrefs and hrefs that do not form a valid URL.
pub(crate) fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => Some(absolute_url.to_string()),
        Err(e) => {
            tracing::debug!("Could not resolve {} against {}: {}", href, base_url, e);
            None
        }
    }
}
