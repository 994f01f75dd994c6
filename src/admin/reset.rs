//! Database reset

use crate::storage::{ProgramStore, StorageResult};

/// Rows removed by a reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetSummary {
    pub details_deleted: u64,
    pub programs_deleted: u64,
}

/// Deletes all details, then all programs, in one transaction
///
/// On failure nothing is deleted. Resetting an empty database succeeds.
pub fn reset(store: &mut dyn ProgramStore) -> StorageResult<ResetSummary> {
    tracing::info!("Resetting database...");
    let (details_deleted, programs_deleted) = store.delete_all()?;
    tracing::info!("Deleted {} program details records", details_deleted);
    tracing::info!("Deleted {} funding program records", programs_deleted);

    Ok(ResetSummary {
        details_deleted,
        programs_deleted,
    })
}
