//! Administrative operations on the program database
//!
//! - [`reset`]: wipes every program and detail record
//! - [`verify`]: read-only health report with a sample program

mod reset;
mod verify;

pub use reset::{reset, ResetSummary};
pub use verify::{print_report, verify, SampleProgram, VerifyReport, SUMMARY_PREVIEW_CHARS};
