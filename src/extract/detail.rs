//! Detail page extraction
//!
//! A detail page carries a heading, a definition list of labelled values and
//! up to three tabbed long-text articles. Labels are German on the live site;
//! they are normalized before lookup (see [`normalize_label`]).

use crate::extract::{
    element_text, select_attr, select_text, selector, DetailFields, DetailLabel, FieldKey,
};
use scraper::{ElementRef, Html};

const TITLE_SELECTOR: &str = "h1.title";
const INFO_LIST_SELECTOR: &str = "dl.grid-modul--two-elements.document-info-fundingprogram";
const TAB_IDS: [&str; 3] = ["tab1", "tab2", "tab3"];

/// Extracts all recognized fields from a rendered detail page
///
/// Never fails. Fields that are absent or unreadable are left out of
/// [`DetailFields::text`] and read back as empty strings.
pub fn extract_detail_fields(html: &str) -> DetailFields {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut fields = DetailFields {
        title: select_text(root, TITLE_SELECTOR),
        ..DetailFields::default()
    };

    if let Some(list) = selector(INFO_LIST_SELECTOR).and_then(|sel| root.select(&sel).next()) {
        read_info_list(list, &mut fields);
    } else {
        tracing::warn!("Detail page has no program info list");
    }

    for (index, tab_id) in TAB_IDS.iter().enumerate() {
        let Some(key) = FieldKey::for_tab(index) else {
            continue;
        };
        let css = format!("article#{}", tab_id);
        if let Some(article) = selector(&css).and_then(|sel| root.select(&sel).next()) {
            fields.set(key, block_text(article));
        }
    }

    fields
}

fn read_info_list(list: ElementRef<'_>, fields: &mut DetailFields) {
    let (Some(dt_selector), Some(dd_selector)) = (selector("dt"), selector("dd")) else {
        return;
    };

    for (dt, dd) in list.select(&dt_selector).zip(list.select(&dd_selector)) {
        let label = normalize_label(&element_text(dt));
        match DetailLabel::classify(&label) {
            DetailLabel::Text(key) => fields.set(key, element_text(dd)),
            DetailLabel::FurtherLinks => fields.further_links = anchor_hrefs(dd),
            DetailLabel::Contact => read_contact(dd, fields),
            DetailLabel::Unknown => tracing::debug!("Dropping unrecognized label '{}'", label),
        }
    }
}

/// Fans the contact block out into the six provider fields
fn read_contact(contact: ElementRef<'_>, fields: &mut DetailFields) {
    fields.set(
        FieldKey::ProviderName,
        select_text(contact, "p.card--title"),
    );
    fields.set(
        FieldKey::ProviderAddress,
        select_text(contact, "div.address"),
    );
    fields.set(
        FieldKey::ProviderPhone,
        split_after_colon(&select_text(contact, "p.tel")),
    );
    fields.set(
        FieldKey::ProviderFax,
        split_after_colon(&select_text(contact, "p.fax")),
    );

    let email = select_attr(contact, "p.email a", "href");
    let email = email.strip_prefix("mailto:").unwrap_or(&email).to_string();
    fields.set(FieldKey::ProviderEmail, email);

    fields.set(
        FieldKey::ProviderWebsite,
        select_attr(contact, "p.website a", "href"),
    );
}

fn anchor_hrefs(element: ElementRef<'_>) -> Vec<String> {
    let Some(anchor_selector) = selector("a[href]") else {
        return Vec::new();
    };

    element
        .select(&anchor_selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Visible text with one line per text node
fn block_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turns a definition-list label into a lookup key
///
/// Trims, drops a trailing colon, lower-cases and joins words with `_`:
/// `"Weiterführende Links:"` becomes `"weiterführende_links"`.
pub fn normalize_label(label: &str) -> String {
    label
        .trim()
        .trim_end_matches(':')
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Text after the first colon, trimmed; the input unchanged when it has none
pub fn split_after_colon(text: &str) -> String {
    match text.split_once(':') {
        Some((_, rest)) => rest.trim().to_string(),
        None => text.to_string(),
    }
}
