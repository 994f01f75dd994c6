//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ProgramStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ProgramStore, StorageError, StorageResult};
use crate::storage::{DetailsWrite, ProgramDetails, ProgramRecord};
use crate::FundingError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const PROGRAM_COLUMNS: &str =
    "p.id, p.program_url, p.program_name, p.is_scraped, p.discovered_at, p.scraped_at";

const DETAIL_COLUMNS: &str = "d.funding_type, d.support_area, d.funding_area, d.eligibility,
     d.funding_provider_raw, d.provider_name, d.provider_address, d.provider_phone,
     d.provider_fax, d.provider_email, d.provider_website, d.further_links,
     d.short_summary, d.additional_information, d.legal_basis";

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(FundingError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, FundingError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, FundingError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn program_from_row(row: &Row<'_>) -> rusqlite::Result<ProgramRecord> {
    Ok(ProgramRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        is_scraped: row.get(3)?,
        discovered_at: row.get(4)?,
        scraped_at: row.get(5)?,
    })
}

/// Reads the detail columns starting at `offset`
fn details_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<ProgramDetails> {
    let links_json: String = row.get(offset + 11)?;
    let further_links = serde_json::from_str(&links_json).unwrap_or_else(|e| {
        tracing::warn!("Unreadable further_links value {:?}: {}", links_json, e);
        Vec::new()
    });

    Ok(ProgramDetails {
        funding_type: row.get(offset)?,
        support_area: row.get(offset + 1)?,
        funding_area: row.get(offset + 2)?,
        eligibility: row.get(offset + 3)?,
        funding_provider_raw: row.get(offset + 4)?,
        provider_name: row.get(offset + 5)?,
        provider_address: row.get(offset + 6)?,
        provider_phone: row.get(offset + 7)?,
        provider_fax: row.get(offset + 8)?,
        provider_email: row.get(offset + 9)?,
        provider_website: row.get(offset + 10)?,
        further_links,
        short_summary: row.get(offset + 12)?,
        additional_information: row.get(offset + 13)?,
        legal_basis: row.get(offset + 14)?,
    })
}

/// Inserts or updates the details row of a program
fn write_details(
    conn: &Connection,
    program_id: i64,
    details: &ProgramDetails,
) -> StorageResult<DetailsWrite> {
    let links_json = serde_json::to_string(&details.further_links)?;
    let now = Utc::now().to_rfc3339();

    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM program_details WHERE program_id = ?1",
            params![program_id],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(details_id) = existing {
        conn.execute(
            "UPDATE program_details SET
                funding_type = ?1, support_area = ?2, funding_area = ?3, eligibility = ?4,
                funding_provider_raw = ?5, provider_name = ?6, provider_address = ?7,
                provider_phone = ?8, provider_fax = ?9, provider_email = ?10,
                provider_website = ?11, further_links = ?12, short_summary = ?13,
                additional_information = ?14, legal_basis = ?15, updated_at = ?16
             WHERE id = ?17",
            params![
                details.funding_type,
                details.support_area,
                details.funding_area,
                details.eligibility,
                details.funding_provider_raw,
                details.provider_name,
                details.provider_address,
                details.provider_phone,
                details.provider_fax,
                details.provider_email,
                details.provider_website,
                links_json,
                details.short_summary,
                details.additional_information,
                details.legal_basis,
                now,
                details_id,
            ],
        )?;
        return Ok(DetailsWrite::Updated);
    }

    conn.execute(
        "INSERT INTO program_details (
            program_id, funding_type, support_area, funding_area, eligibility,
            funding_provider_raw, provider_name, provider_address, provider_phone,
            provider_fax, provider_email, provider_website, further_links,
            short_summary, additional_information, legal_basis, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            program_id,
            details.funding_type,
            details.support_area,
            details.funding_area,
            details.eligibility,
            details.funding_provider_raw,
            details.provider_name,
            details.provider_address,
            details.provider_phone,
            details.provider_fax,
            details.provider_email,
            details.provider_website,
            links_json,
            details.short_summary,
            details.additional_information,
            details.legal_basis,
            now,
        ],
    )?;
    Ok(DetailsWrite::Created)
}

fn mark_scraped(conn: &Connection, program_id: i64) -> StorageResult<()> {
    let now = Utc::now().to_rfc3339();
    let updated = conn.execute(
        "UPDATE funding_programs SET is_scraped = 1, scraped_at = ?1 WHERE id = ?2",
        params![now, program_id],
    )?;
    if updated == 0 {
        return Err(StorageError::ProgramNotFound(program_id));
    }
    Ok(())
}

fn count(conn: &Connection, sql: &str) -> StorageResult<u64> {
    let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count as u64)
}

impl ProgramStore for SqliteStore {
    // ===== Programs =====

    fn find_program_by_url(&self, url: &str) -> StorageResult<Option<ProgramRecord>> {
        let sql = format!(
            "SELECT {} FROM funding_programs p WHERE p.program_url = ?1",
            PROGRAM_COLUMNS
        );
        let program = self
            .conn
            .query_row(&sql, params![url], program_from_row)
            .optional()?;
        Ok(program)
    }

    fn create_program(&mut self, url: &str, name: &str) -> StorageResult<ProgramRecord> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO funding_programs (program_url, program_name, is_scraped, discovered_at)
             VALUES (?1, ?2, 0, ?3)",
            params![url, name, now],
        )?;

        Ok(ProgramRecord {
            id: self.conn.last_insert_rowid(),
            url: url.to_string(),
            name: name.to_string(),
            is_scraped: false,
            discovered_at: now,
            scraped_at: None,
        })
    }

    fn set_scraped(&mut self, program_id: i64) -> StorageResult<()> {
        mark_scraped(&self.conn, program_id)
    }

    fn clear_scraped(&mut self, program_id: i64) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE funding_programs SET is_scraped = 0, scraped_at = NULL WHERE id = ?1",
            params![program_id],
        )?;
        if updated == 0 {
            return Err(StorageError::ProgramNotFound(program_id));
        }
        Ok(())
    }

    // ===== Details =====

    fn get_details(&self, program_id: i64) -> StorageResult<Option<ProgramDetails>> {
        let sql = format!(
            "SELECT {} FROM program_details d WHERE d.program_id = ?1",
            DETAIL_COLUMNS
        );
        let details = self
            .conn
            .query_row(&sql, params![program_id], |row| details_from_row(row, 0))
            .optional()?;
        Ok(details)
    }

    fn upsert_details(
        &mut self,
        program_id: i64,
        details: &ProgramDetails,
    ) -> StorageResult<DetailsWrite> {
        write_details(&self.conn, program_id, details)
    }

    fn save_scrape(
        &mut self,
        program_id: i64,
        details: &ProgramDetails,
    ) -> StorageResult<DetailsWrite> {
        // Dropping the transaction without commit rolls it back
        let tx = self.conn.transaction()?;
        let write = write_details(&tx, program_id, details)?;
        mark_scraped(&tx, program_id)?;
        tx.commit()?;
        Ok(write)
    }

    // ===== Admin =====

    fn delete_all(&mut self) -> StorageResult<(u64, u64)> {
        let tx = self.conn.transaction()?;
        let details = tx.execute("DELETE FROM program_details", [])?;
        let programs = tx.execute("DELETE FROM funding_programs", [])?;
        tx.commit()?;
        Ok((details as u64, programs as u64))
    }

    // ===== Statistics =====

    fn count_programs(&self) -> StorageResult<u64> {
        count(&self.conn, "SELECT COUNT(*) FROM funding_programs")
    }

    fn count_with_details(&self) -> StorageResult<u64> {
        count(
            &self.conn,
            "SELECT COUNT(*) FROM funding_programs p
             JOIN program_details d ON d.program_id = p.id",
        )
    }

    fn count_scraped(&self) -> StorageResult<u64> {
        count(
            &self.conn,
            "SELECT COUNT(*) FROM funding_programs WHERE is_scraped = 1",
        )
    }

    fn count_scraped_without_details(&self) -> StorageResult<u64> {
        count(
            &self.conn,
            "SELECT COUNT(*) FROM funding_programs p
             LEFT JOIN program_details d ON d.program_id = p.id
             WHERE p.is_scraped = 1 AND d.id IS NULL",
        )
    }

    fn sample_with_details(&self) -> StorageResult<Option<(ProgramRecord, ProgramDetails)>> {
        let sql = format!(
            "SELECT {}, {} FROM funding_programs p
             JOIN program_details d ON d.program_id = p.id
             ORDER BY p.id ASC LIMIT 1",
            PROGRAM_COLUMNS, DETAIL_COLUMNS
        );
        let sample = self
            .conn
            .query_row(&sql, [], |row| {
                Ok((program_from_row(row)?, details_from_row(row, 6)?))
            })
            .optional()?;
        Ok(sample)
    }
}
