//! Storage module for persisting funding programs
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Program upsert keyed by URL
//! - One-to-one detail records, written in the same transaction that marks a
//!   program as scraped
//! - Bulk reset and the counts behind the verification report

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{ProgramStore, StorageError, StorageResult};

use crate::extract::{DetailFields, FieldKey};
use crate::FundingError;

use std::path::Path;

/// Opens (and if needed creates) the program database
pub fn open_store(path: &Path) -> Result<SqliteStore, FundingError> {
    SqliteStore::new(path)
}

/// A funding program row
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramRecord {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub is_scraped: bool,
    pub discovered_at: String,
    pub scraped_at: Option<String>,
}

/// Structured details of one program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramDetails {
    pub funding_type: String,
    pub support_area: String,
    pub funding_area: String,
    pub eligibility: String,
    pub funding_provider_raw: String,
    pub provider_name: String,
    pub provider_address: String,
    pub provider_phone: String,
    pub provider_fax: String,
    pub provider_email: String,
    pub provider_website: String,
    pub further_links: Vec<String>,
    pub short_summary: String,
    pub additional_information: String,
    pub legal_basis: String,
}

impl From<&DetailFields> for ProgramDetails {
    fn from(fields: &DetailFields) -> Self {
        Self {
            funding_type: fields.get(FieldKey::FundingType),
            support_area: fields.get(FieldKey::SupportArea),
            funding_area: fields.get(FieldKey::FundingArea),
            eligibility: fields.get(FieldKey::Eligibility),
            funding_provider_raw: fields.get(FieldKey::FundingProviderRaw),
            provider_name: fields.get(FieldKey::ProviderName),
            provider_address: fields.get(FieldKey::ProviderAddress),
            provider_phone: fields.get(FieldKey::ProviderPhone),
            provider_fax: fields.get(FieldKey::ProviderFax),
            provider_email: fields.get(FieldKey::ProviderEmail),
            provider_website: fields.get(FieldKey::ProviderWebsite),
            further_links: fields.further_links.clone(),
            short_summary: fields.get(FieldKey::ShortSummary),
            additional_information: fields.get(FieldKey::AdditionalInformation),
            legal_basis: fields.get(FieldKey::LegalBasis),
        }
    }
}

/// Whether a detail write inserted a new row or replaced an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailsWrite {
    Created,
    Updated,
}

impl DetailsWrite {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_from_fields() {
        let mut fields = DetailFields::default();
        fields.set(FieldKey::FundingType, "Zuschuss".to_string());
        fields.set(FieldKey::ProviderPhone, "+49 30 1234".to_string());
        fields.set(FieldKey::LegalBasis, "Richtlinie".to_string());
        fields.further_links = vec!["https://a.example".to_string()];

        let details = ProgramDetails::from(&fields);
        assert_eq!(details.funding_type, "Zuschuss");
        assert_eq!(details.provider_phone, "+49 30 1234");
        assert_eq!(details.legal_basis, "Richtlinie");
        assert_eq!(details.further_links, vec!["https://a.example".to_string()]);
        assert_eq!(details.support_area, "");
        assert_eq!(details.short_summary, "");
    }
}
