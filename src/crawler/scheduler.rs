//! Weekly crawl scheduling
//!
//! In schedule mode the crawler runs once right away and then once a week at
//! a fixed local weekday and time, until interrupted with Ctrl+C.

use crate::config::{parse_schedule_time, parse_schedule_weekday, Config, ScheduleConfig};
use crate::crawler::coordinator::run_crawl;
use crate::ConfigError;
use chrono::{Datelike, Days, Local, NaiveDateTime, NaiveTime, Timelike, Weekday};
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Weekday and local time at which scheduled crawls start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyAnchor {
    pub weekday: Weekday,
    pub time: NaiveTime,
}

impl WeeklyAnchor {
    /// Resolves the anchor from config, filling gaps from `now`
    ///
    /// A missing time falls back to the current minute.
    pub fn resolve(config: &ScheduleConfig, now: NaiveDateTime) -> Result<Self, ConfigError> {
        let weekday = match &config.weekday {
            Some(value) => parse_schedule_weekday(value)?,
            None => now.weekday(),
        };
        let time = match &config.time {
            Some(value) => parse_schedule_time(value)?,
            None => NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap_or(now.time()),
        };
        Ok(Self { weekday, time })
    }

    /// First occurrence of the anchor strictly after `now`
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.weekday().num_days_from_monday();
        let target = self.weekday.num_days_from_monday();
        let days_ahead = (7 + target - today) % 7;

        let candidate = (now.date() + Days::new(u64::from(days_ahead))).and_time(self.time);
        if candidate > now {
            candidate
        } else {
            candidate + Days::new(7)
        }
    }
}

impl fmt::Display for WeeklyAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "every {} at {}", self.weekday, self.time.format("%H:%M"))
    }
}

/// Runs a crawl now and then weekly until Ctrl+C
///
/// A failed run is logged and the next one is still scheduled. Ctrl+C stops
/// the scheduler while it waits and also while a crawl is running.
///
/// # Returns
///
/// * `Ok(())` - Stopped by the user
/// * `Err(ConfigError)` - The schedule in the config is invalid
pub async fn run_weekly(config: &Config) -> Result<(), ConfigError> {
    let anchor = WeeklyAnchor::resolve(&config.schedule, Local::now().naive_local())?;
    tracing::info!("Crawler scheduled to run {}. Press Ctrl+C to exit.", anchor);

    let next_wait = || {
        let now = Local::now().naive_local();
        let next = anchor.next_after(now);
        tracing::info!("Next crawl at {}", next.format("%Y-%m-%d %H:%M"));
        (next - now).to_std().unwrap_or_default()
    };
    run_until(config, next_wait, ctrl_c()).await;
    Ok(())
}

/// Resolves on the first Ctrl+C
///
/// If the signal handler cannot be installed this never resolves.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Crawls immediately, then again after each `next_wait()`, until `shutdown`
/// resolves
///
/// `shutdown` is raced against both the wait and the crawl itself. Programs
/// committed before an interruption stay committed.
pub(crate) async fn run_until<W, S>(config: &Config, mut next_wait: W, shutdown: S)
where
    W: FnMut() -> Duration,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    tracing::info!("Running crawler immediately...");
    loop {
        tokio::select! {
            _ = run_scheduled_crawl(config) => {}
            _ = &mut shutdown => {
                tracing::info!("Scheduler stopped by user, current crawl abandoned");
                return;
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(next_wait()) => {}
            _ = &mut shutdown => {
                tracing::info!("Scheduler stopped by user");
                return;
            }
        }
    }
}

async fn run_scheduled_crawl(config: &Config) {
    match run_crawl(config).await {
        Ok(stats) => tracing::info!("Scheduled crawl finished: {}", stats),
        Err(e) => tracing::error!("Scheduled crawl failed: {}", e),
    }
}
