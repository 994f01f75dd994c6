use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Parses and validates configuration from TOML text
///
/// Absent sections and keys fall back to their defaults; only
/// `[output] database-path` is required.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads and parses a configuration file from the given path
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use funding_crawler::config::load_config;
///
/// let config = load_config(Path::new("crawler.toml")).unwrap();
/// println!("Database: {}", config.output.database_path);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    parse_config(&std::fs::read_to_string(path)?)
}

/// Hex-encoded SHA-256 of configuration text, logged to match a run to its
/// settings
pub fn config_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Loads a configuration and returns it with the hash of the exact text read
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, config_hash(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_BASE_URL, DEFAULT_START_URL};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL_CONFIG: &str = r#"
[crawler]
base-url = "https://funding.example.org"
start-url = "https://funding.example.org/search?page=1"
page-delay-ms = 250

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[renderer]
enabled = false
network-idle-ms = 750

[output]
database-path = "./test.db"

[schedule]
weekday = "tuesday"
time = "04:30"
"#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(FULL_CONFIG).unwrap();

        assert_eq!(config.crawler.base_url, "https://funding.example.org");
        assert_eq!(config.crawler.page_delay_ms, 250);
        assert_eq!(config.crawler.request_timeout_secs, 30);
        assert_eq!(config.user_agent.crawler_name, "TestCrawler");
        assert!(!config.renderer.enabled);
        assert_eq!(config.renderer.network_idle_ms, 750);
        assert_eq!(config.output.database_path, "./test.db");
        assert_eq!(config.schedule.weekday.as_deref(), Some("tuesday"));
        assert_eq!(config.schedule.time.as_deref(), Some("04:30"));
    }

    #[test]
    fn test_only_output_required() {
        let config = parse_config("[output]\ndatabase-path = \"./programs.db\"\n").unwrap();

        assert_eq!(config.crawler.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.crawler.start_url, DEFAULT_START_URL);
        assert_eq!(config.crawler.page_delay_ms, 1000);
        assert!(config.renderer.enabled);
        assert!(config.renderer.headless);
        assert!(config.schedule.weekday.is_none());
    }

    #[test]
    fn test_missing_output_is_parse_error() {
        let result = parse_config("[crawler]\npage-delay-ms = 10\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            parse_config("this is not valid TOML {{{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_out_of_range_value_fails_validation() {
        let result =
            parse_config("[renderer]\nnetwork-idle-ms = 5\n[output]\ndatabase-path = \"a.db\"\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_with_hash_matches_file_hash() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(FULL_CONFIG.as_bytes()).unwrap();
        file.flush().unwrap();

        let (config, hash) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(config.output.database_path, "./test.db");
        assert_eq!(hash, config_hash(FULL_CONFIG));
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_hash_depends_on_content() {
        assert_eq!(config_hash("a"), config_hash("a"));
        assert_ne!(config_hash("content 1"), config_hash("content 2"));
        // Known SHA-256 of the empty string
        assert_eq!(
            config_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
