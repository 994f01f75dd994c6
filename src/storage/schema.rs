//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the program database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per discovered program; program_url is the natural key
CREATE TABLE IF NOT EXISTS funding_programs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    program_url TEXT NOT NULL UNIQUE,
    program_name TEXT NOT NULL,
    is_scraped INTEGER NOT NULL DEFAULT 0,
    discovered_at TEXT NOT NULL,
    scraped_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_funding_programs_scraped ON funding_programs(is_scraped);

-- At most one details row per program, removed with its program
CREATE TABLE IF NOT EXISTS program_details (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    program_id INTEGER NOT NULL UNIQUE REFERENCES funding_programs(id) ON DELETE CASCADE,
    funding_type TEXT NOT NULL DEFAULT '',
    support_area TEXT NOT NULL DEFAULT '',
    funding_area TEXT NOT NULL DEFAULT '',
    eligibility TEXT NOT NULL DEFAULT '',
    funding_provider_raw TEXT NOT NULL DEFAULT '',
    provider_name TEXT NOT NULL DEFAULT '',
    provider_address TEXT NOT NULL DEFAULT '',
    provider_phone TEXT NOT NULL DEFAULT '',
    provider_fax TEXT NOT NULL DEFAULT '',
    provider_email TEXT NOT NULL DEFAULT '',
    provider_website TEXT NOT NULL DEFAULT '',
    further_links TEXT NOT NULL DEFAULT '[]',
    short_summary TEXT NOT NULL DEFAULT '',
    additional_information TEXT NOT NULL DEFAULT '',
    legal_basis TEXT NOT NULL DEFAULT '',
    updated_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
