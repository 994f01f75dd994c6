//! Tracing subscriber setup
//!
//! Log lines always go to the console. With a log file configured they are
//! also appended to that file, without ANSI colors.

use crate::FundingError;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directives for the `-v`/`-q` flags
pub fn verbosity_directives(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        // Only show errors
        return "error";
    }
    match verbose {
        0 => "funding_crawler=info,warn",
        1 => "funding_crawler=debug,info",
        2 => "funding_crawler=trace,debug",
        _ => "trace",
    }
}

/// Opens the log file for appending, creating it if needed
pub fn open_log_file(path: &Path) -> Result<File, FundingError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(file)
}

/// Builds the subscriber: console layer plus an optional file layer
pub fn build_subscriber(
    verbose: u8,
    quiet: bool,
    log_file: Option<File>,
) -> impl Subscriber + Send + Sync {
    let console = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let file = log_file.map(|file| {
        fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(EnvFilter::new(verbosity_directives(verbose, quiet)))
        .with(console)
        .with(file)
}

/// Installs the global subscriber
///
/// # Returns
///
/// * `Ok(())` - Logging is set up
/// * `Err(FundingError)` - The log file could not be opened
pub fn init_logging(
    verbose: u8,
    quiet: bool,
    log_path: Option<&Path>,
) -> Result<(), FundingError> {
    let log_file = log_path.map(open_log_file).transpose()?;
    build_subscriber(verbose, quiet, log_file).init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_verbosity_ladder() {
        assert_eq!(verbosity_directives(0, false), "funding_crawler=info,warn");
        assert_eq!(verbosity_directives(1, false), "funding_crawler=debug,info");
        assert_eq!(verbosity_directives(2, false), "funding_crawler=trace,debug");
        assert_eq!(verbosity_directives(5, false), "trace");
        assert_eq!(verbosity_directives(0, true), "error");
    }

    #[test]
    fn test_log_lines_are_written_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("crawler.log");
        std::fs::write(&path, "earlier run\n").unwrap();

        let subscriber = build_subscriber(0, false, Some(open_log_file(&path).unwrap()));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Added new program: Gründungszuschuss");
            tracing::debug!("hidden at default verbosity");
        });

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("earlier run\n"));
        assert!(content.contains("Added new program: Gründungszuschuss"));
        assert!(!content.contains("hidden at default verbosity"));
        assert!(!content.contains('\u{1b}'));
    }

    #[test]
    fn test_open_log_file_in_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = open_log_file(&temp_dir.path().join("missing").join("crawler.log"));
        assert!(matches!(result, Err(FundingError::Io(_))));
    }
}
