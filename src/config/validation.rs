use crate::config::types::{BackendConfig, Config, CrawlerConfig, ForumConfig, OutputConfig};
use crate::crawler::ThreadSelectors;
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_forum_config(&config.forum)?;
    validate_backend_config(&config.backend)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    ThreadSelectors::compile(&config.selectors)?;
    Ok(())
}

/// Validates the bearer credential for the scraping backend
///
/// The key ends up in an `Authorization` header, so it must be non-empty and
/// free of whitespace and control characters.
pub fn validate_api_key(key: Option<&str>, env_var: &str) -> Result<String, ConfigError> {
    let key = key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ConfigError::Credential(format!("{} is not set", env_var)))?;

    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ConfigError::Credential(format!(
            "{} contains whitespace or control characters",
            env_var
        )));
    }

    Ok(key.to_string())
}

/// Validates forum configuration
fn validate_forum_config(config: &ForumConfig) -> Result<(), ConfigError> {
    if config.name.trim().is_empty() {
        return Err(ConfigError::Validation("forum name cannot be empty".to_string()));
    }

    validate_http_url("base-url", &config.base_url)?;

    if !config.listing_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "listing-path must start with '/', got '{}'",
            config.listing_path
        )));
    }

    let pattern = Regex::new(&config.thread_pattern).map_err(|e| {
        ConfigError::InvalidPattern(format!("thread-pattern '{}': {}", config.thread_pattern, e))
    })?;

    // Group 0 is the whole match; group 1 must carry the thread id
    if pattern.captures_len() < 2 {
        return Err(ConfigError::InvalidPattern(format!(
            "thread-pattern '{}' needs a capture group for the thread id",
            config.thread_pattern
        )));
    }

    Ok(())
}

/// Validates backend configuration
fn validate_backend_config(config: &BackendConfig) -> Result<(), ConfigError> {
    validate_http_url("api-url", &config.api_url)?;

    if config.api_key_env.is_empty() {
        return Err(ConfigError::Validation(
            "api-key-env cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if !config.min_delay_secs.is_finite() || config.min_delay_secs < 0.0 {
        return Err(ConfigError::Validation(format!(
            "min-delay-secs must be a non-negative number, got {}",
            config.min_delay_secs
        )));
    }

    if config.max_posts == Some(0) {
        return Err(ConfigError::Validation(
            "max-posts must be >= 1 when set".to_string(),
        ));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if !config.backoff_base_secs.is_finite() || config.backoff_base_secs < 0.0 {
        return Err(ConfigError::Validation(format!(
            "backoff-base-secs must be a non-negative number, got {}",
            config.backoff_base_secs
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.json_path.is_empty() {
        return Err(ConfigError::Validation(
            "json-path cannot be empty".to_string(),
        ));
    }

    if config.log_path.is_empty() {
        return Err(ConfigError::Validation(
            "log-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            field, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_base_url() {
        let mut config = Config::default();
        config.forum.base_url = "ftp://forum.example.com".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));

        config.forum.base_url = "not a url".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_listing_path() {
        let mut config = Config::default();
        config.forum.listing_path = "latest".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_thread_pattern() {
        let mut config = Config::default();
        config.forum.thread_pattern = r"^/t/[^/]+/\d+".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidPattern(_))
        ));

        config.forum.thread_pattern = r"^/t/([".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_validate_crawler_limits() {
        let mut config = Config::default();
        config.crawler.max_posts = Some(0);
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.crawler.max_attempts = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.crawler.min_delay_secs = f64::NAN;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.crawler.min_delay_secs = 0.0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_selectors() {
        let mut config = Config::default();
        config.selectors.title = "h1[".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_validate_api_key() {
        assert_eq!(
            validate_api_key(Some("fc-abc123"), "FIRECRAWL_API_KEY").unwrap(),
            "fc-abc123"
        );
        assert_eq!(
            validate_api_key(Some("  fc-abc123\n"), "FIRECRAWL_API_KEY").unwrap(),
            "fc-abc123"
        );

        assert!(validate_api_key(None, "FIRECRAWL_API_KEY").is_err());
        assert!(validate_api_key(Some(""), "FIRECRAWL_API_KEY").is_err());
        assert!(validate_api_key(Some("   "), "FIRECRAWL_API_KEY").is_err());
        assert!(validate_api_key(Some("fc abc"), "FIRECRAWL_API_KEY").is_err());
    }
}
