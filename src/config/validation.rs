use crate::config::types::{
    Config, CrawlerConfig, OutputConfig, RendererConfig, ScheduleConfig, UserAgentConfig,
};
use crate::ConfigError;
use chrono::{NaiveTime, Weekday};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_renderer_config(&config.renderer)?;
    validate_output_config(&config.output)?;
    validate_schedule_config(&config.schedule)?;
    Ok(())
}

/// Validates crawl target and pacing
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_http_url("base_url", &config.base_url)?;
    validate_http_url("start_url", &config.start_url)?;

    if config.page_delay_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "page_delay_ms must be <= 60000ms, got {}ms",
            config.page_delay_ms
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_renderer_config(config: &RendererConfig) -> Result<(), ConfigError> {
    if config.network_idle_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "network_idle_ms must be >= 100ms, got {}ms",
            config.network_idle_ms
        )));
    }

    if config.navigation_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "navigation_timeout_secs must be >= 1".to_string(),
        ));
    }

    if let Some(path) = &config.chrome_executable {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "chrome_executable cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_schedule_config(config: &ScheduleConfig) -> Result<(), ConfigError> {
    if let Some(weekday) = &config.weekday {
        parse_schedule_weekday(weekday)?;
    }
    if let Some(time) = &config.time {
        parse_schedule_time(time)?;
    }
    Ok(())
}

/// Parses a weekday name ("monday", "Mon", ...)
pub fn parse_schedule_weekday(value: &str) -> Result<Weekday, ConfigError> {
    value
        .trim()
        .parse::<Weekday>()
        .map_err(|_| ConfigError::Validation(format!("Invalid schedule weekday: '{}'", value)))
}

/// Parses a local wall-clock time in "HH:MM" form
pub fn parse_schedule_time(value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ConfigError::Validation(format!("Invalid schedule time (HH:MM): '{}'", value)))
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
