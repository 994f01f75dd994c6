use serde::Deserialize;

/// Search results for funding programs, sorted by issue date ascending
pub const DEFAULT_BASE_URL: &str = "https://www.foerderdatenbank.de";
pub const DEFAULT_START_URL: &str = "https://www.foerderdatenbank.de/SiteGlobals/FDB/Forms/Suche/Foederprogrammsuche_Formular.html?submit=Suchen&filterCategories=FundingProgram&sortOrder=dateOfIssue_dt+asc";

/// Main configuration structure for Funding-Crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Crawl target and pacing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Origin that relative program and pagination links resolve against
    pub base_url: String,

    /// First listing page of the walk
    pub start_url: String,

    /// Pause between two listing pages (milliseconds)
    pub page_delay_ms: u64,

    /// Timeout for a single static request (seconds)
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            start_url: DEFAULT_START_URL.to_string(),
            page_delay_ms: 1000,
            request_timeout_secs: 30,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,

    /// Email address for crawler-related contact
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "FundingCrawler".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.org/funding-crawler".to_string(),
            contact_email: "crawler@example.org".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Headless browser used for detail pages
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RendererConfig {
    /// When false, detail pages are fetched statically like listing pages
    pub enabled: bool,

    pub headless: bool,

    /// Pass `--no-sandbox` to Chromium (needed in most containers)
    pub no_sandbox: bool,

    /// Explicit Chromium/Chrome binary; auto-detected when absent
    pub chrome_executable: Option<String>,

    /// How long the network must stay quiet before a page counts as loaded (milliseconds)
    pub network_idle_ms: u64,

    /// In-flight requests tolerated while still considered idle
    pub max_inflight_requests: usize,

    /// Upper bound for navigation plus the idle wait (seconds)
    pub navigation_timeout_secs: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            headless: true,
            no_sandbox: false,
            chrome_executable: None,
            network_idle_ms: 500,
            max_inflight_requests: 0,
            navigation_timeout_secs: 30,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the SQLite database file
    pub database_path: String,
}

/// Weekly anchor for `--schedule`
///
/// Both fields are optional. Missing fields are taken from the local time at
/// which the scheduler starts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScheduleConfig {
    /// Day of the week, e.g. "monday" or "mon"
    pub weekday: Option<String>,

    /// Local wall-clock time, "HH:MM"
    pub time: Option<String>,
}
