//! Database verification report
//!
//! Collects the record counts and one sample program from the storage layer
//! and prints them for a quick manual check after a crawl.

use crate::storage::{ProgramStore, StorageResult};

/// Number of characters of the short summary shown in the report
pub const SUMMARY_PREVIEW_CHARS: usize = 100;

/// Key fields of one program with details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleProgram {
    pub name: String,
    pub url: String,
    pub funding_type: String,
    pub support_area: String,
    pub funding_area: String,
    pub eligibility: String,
    pub provider_name: String,
    pub provider_website: String,
    /// At most [`SUMMARY_PREVIEW_CHARS`] characters of the short summary
    pub summary_preview: String,
}

/// Verification summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// Total number of programs
    pub total_programs: u64,

    /// Programs that have a details record
    pub with_details: u64,

    /// Programs flagged as scraped
    pub scraped: u64,

    /// Programs flagged as scraped without details; should always be 0
    pub scraped_without_details: u64,

    /// First program that has details, if any
    pub sample: Option<SampleProgram>,
}

impl VerifyReport {
    /// Whether every scraped program has its details
    pub fn is_consistent(&self) -> bool {
        self.scraped_without_details == 0
    }
}

/// Builds the verification report
///
/// # Arguments
///
/// * `store` - The storage backend to query
///
/// # Returns
///
/// * `Ok(VerifyReport)` - Successfully collected the report
/// * `Err(StorageError)` - Failed to query the database
pub fn verify(store: &dyn ProgramStore) -> StorageResult<VerifyReport> {
    let total_programs = store.count_programs()?;
    let with_details = store.count_with_details()?;
    let scraped = store.count_scraped()?;
    let scraped_without_details = store.count_scraped_without_details()?;

    let sample = store
        .sample_with_details()?
        .map(|(program, details)| SampleProgram {
            name: program.name,
            url: program.url,
            funding_type: details.funding_type,
            support_area: details.support_area,
            funding_area: details.funding_area,
            eligibility: details.eligibility,
            provider_name: details.provider_name,
            provider_website: details.provider_website,
            summary_preview: preview(&details.short_summary, SUMMARY_PREVIEW_CHARS),
        });

    Ok(VerifyReport {
        total_programs,
        with_details,
        scraped,
        scraped_without_details,
        sample,
    })
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &VerifyReport) {
    println!("=== Database Verification ===\n");

    println!("Overview:");
    println!("  Total funding programs: {}", report.total_programs);
    println!("  Programs with details: {}", report.with_details);
    println!("  Programs marked scraped: {}", report.scraped);
    if report.is_consistent() {
        println!("  Scraped without details: 0");
    } else {
        println!(
            "  Scraped without details: {} (inconsistent)",
            report.scraped_without_details
        );
    }
    println!();

    match &report.sample {
        Some(sample) => {
            println!("Sample program:");
            println!("  Name: {}", sample.name);
            println!("  URL: {}", sample.url);
            println!("  Funding type: {}", sample.funding_type);
            println!("  Support area: {}", sample.support_area);
            println!("  Funding area: {}", sample.funding_area);
            println!("  Eligibility: {}", sample.eligibility);
            println!("  Provider: {}", sample.provider_name);
            println!("  Provider website: {}", sample.provider_website);
            println!("  Short summary: {}...", sample.summary_preview);
        }
        None => println!("No programs with details yet."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ProgramDetails, SqliteStore};

    #[test]
    fn test_verify_empty_store() {
        let store = SqliteStore::new_in_memory().unwrap();
        let report = verify(&store).unwrap();

        assert_eq!(report.total_programs, 0);
        assert_eq!(report.with_details, 0);
        assert!(report.sample.is_none());
        assert!(report.is_consistent());
    }

    #[test]
    fn test_verify_counts_and_sample() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let first = store
            .create_program("https://a.example/1", "Gründungszuschuss")
            .unwrap();
        store.create_program("https://a.example/2", "Two").unwrap();

        let details = ProgramDetails {
            funding_type: "Zuschuss".to_string(),
            provider_name: "Bundesamt".to_string(),
            short_summary: "ä".repeat(150),
            ..Default::default()
        };
        store.save_scrape(first.id, &details).unwrap();

        let report = verify(&store).unwrap();
        assert_eq!(report.total_programs, 2);
        assert_eq!(report.with_details, 1);
        assert_eq!(report.scraped, 1);
        assert_eq!(report.scraped_without_details, 0);

        let sample = report.sample.unwrap();
        assert_eq!(sample.name, "Gründungszuschuss");
        assert_eq!(sample.funding_type, "Zuschuss");
        assert_eq!(sample.provider_name, "Bundesamt");
        assert_eq!(sample.summary_preview.chars().count(), SUMMARY_PREVIEW_CHARS);
    }

    #[test]
    fn test_verify_flags_scraped_without_details() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let program = store.create_program("https://a.example/1", "One").unwrap();
        store.set_scraped(program.id).unwrap();

        let report = verify(&store).unwrap();
        assert_eq!(report.scraped_without_details, 1);
        assert!(!report.is_consistent());
    }

    #[test]
    fn test_preview_short_text_unchanged() {
        assert_eq!(preview("kurz", 100), "kurz");
    }
}
