//! Funding-Crawler main entry point
//!
//! This is the command-line interface for the funding program crawler.

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use funding_crawler::admin::{print_report, reset, verify};
use funding_crawler::config::{load_config_with_hash, Config};
use funding_crawler::crawler::{run_crawl, run_weekly, CrawlEnd, WeeklyAnchor};
use funding_crawler::logging::init_logging;
use funding_crawler::storage::open_store;
use std::path::{Path, PathBuf};

/// Funding-Crawler: harvests a public funding program directory
///
/// Walks the paginated program listing, renders each new program's detail
/// page and stores the extracted fields in SQLite. Programs that were scraped
/// before are never fetched again.
#[derive(Parser, Debug)]
#[command(name = "funding-crawler")]
#[command(version)]
#[command(about = "Funding program directory crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Also append log output to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Delete all programs and details, then exit
    #[arg(long, conflicts_with_all = ["verify", "schedule", "dry_run"])]
    reset: bool,

    /// Print database counts and a sample program, then exit
    #[arg(long, conflicts_with_all = ["reset", "schedule", "dry_run"])]
    verify: bool,

    /// Crawl now, then once a week until interrupted
    #[arg(long, conflicts_with_all = ["reset", "verify", "dry_run"])]
    schedule: bool,

    /// Validate config and show the effective settings without crawling
    #[arg(long, conflicts_with_all = ["reset", "verify", "schedule"])]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())
        .context("Failed to set up logging")?;

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.reset {
        handle_reset(&config)?;
    } else if cli.verify {
        handle_verify(&config)?;
    } else if cli.schedule {
        run_weekly(&config).await?;
    } else {
        handle_crawl(&config).await?;
    }

    Ok(())
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Funding-Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Base URL: {}", config.crawler.base_url);
    println!("  Start URL: {}", config.crawler.start_url);
    println!("  Page delay: {}ms", config.crawler.page_delay_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nRenderer:");
    if config.renderer.enabled {
        println!("  Headless: {}", config.renderer.headless);
        println!("  Sandbox: {}", !config.renderer.no_sandbox);
        println!(
            "  Chrome executable: {}",
            config
                .renderer
                .chrome_executable
                .as_deref()
                .unwrap_or("(auto-detect)")
        );
        println!(
            "  Network idle: {}ms with at most {} open requests",
            config.renderer.network_idle_ms, config.renderer.max_inflight_requests
        );
        println!(
            "  Navigation timeout: {}s",
            config.renderer.navigation_timeout_secs
        );
    } else {
        println!("  Disabled (detail pages fetched statically)");
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let anchor = WeeklyAnchor::resolve(&config.schedule, Local::now().naive_local())?;
    println!("\nSchedule (--schedule):");
    println!("  Runs immediately, then {}", anchor);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --reset mode: empties the database
fn handle_reset(config: &Config) -> anyhow::Result<()> {
    let mut store = open_store(Path::new(&config.output.database_path))?;

    match reset(&mut store) {
        Ok(summary) => println!(
            "✓ Database reset: {} details and {} programs deleted",
            summary.details_deleted, summary.programs_deleted
        ),
        Err(e) => tracing::error!("Error resetting database, nothing was deleted: {}", e),
    }

    Ok(())
}

/// Handles the --verify mode: prints counts and a sample program
fn handle_verify(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let store = open_store(Path::new(&config.output.database_path))?;

    match verify(&store) {
        Ok(report) => print_report(&report),
        Err(e) => tracing::error!("Error verifying database: {}", e),
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    let stats = run_crawl(config).await.context("Crawl could not start")?;

    match &stats.end {
        CrawlEnd::Exhausted => tracing::info!("Finished scraping all funding programs"),
        CrawlEnd::ListingFailed { url } => {
            tracing::warn!("Crawl ended early, listing page {} failed", url)
        }
    }

    Ok(())
}
