//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{DetailsWrite, ProgramDetails, ProgramRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Program not found: {0}")]
    ProgramNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every mutating method is its own commit boundary. In particular
/// [`ProgramStore::save_scrape`] writes the details and flips `is_scraped` in a
/// single transaction, so a failure leaves the program unscraped.
pub trait ProgramStore {
    // ===== Programs =====

    /// Looks up a program by its unique URL
    fn find_program_by_url(&self, url: &str) -> StorageResult<Option<ProgramRecord>>;

    /// Inserts a new, unscraped program
    ///
    /// Fails with a constraint error if the URL already exists.
    fn create_program(&mut self, url: &str, name: &str) -> StorageResult<ProgramRecord>;

    /// Marks a program as scraped
    fn set_scraped(&mut self, program_id: i64) -> StorageResult<()>;

    /// Clears the scraped flag so the next crawl fetches the program again
    fn clear_scraped(&mut self, program_id: i64) -> StorageResult<()>;

    // ===== Details =====

    /// Gets the details attached to a program
    fn get_details(&self, program_id: i64) -> StorageResult<Option<ProgramDetails>>;

    /// Creates the program's details, or updates them in place if present
    fn upsert_details(
        &mut self,
        program_id: i64,
        details: &ProgramDetails,
    ) -> StorageResult<DetailsWrite>;

    /// Upserts details and marks the program scraped as one transaction
    fn save_scrape(
        &mut self,
        program_id: i64,
        details: &ProgramDetails,
    ) -> StorageResult<DetailsWrite>;

    // ===== Admin =====

    /// Deletes all details, then all programs, as one transaction
    ///
    /// Returns the number of (details, programs) rows removed.
    fn delete_all(&mut self) -> StorageResult<(u64, u64)>;

    // ===== Statistics =====

    /// Total number of programs
    fn count_programs(&self) -> StorageResult<u64>;

    /// Number of programs that have a details record
    fn count_with_details(&self) -> StorageResult<u64>;

    /// Number of programs flagged as scraped
    fn count_scraped(&self) -> StorageResult<u64>;

    /// Programs flagged as scraped that have no details record
    fn count_scraped_without_details(&self) -> StorageResult<u64>;

    /// The first program (by id) that has details, with those details
    fn sample_with_details(&self) -> StorageResult<Option<(ProgramRecord, ProgramDetails)>>;
}
