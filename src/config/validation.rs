use crate::config::types::{Config, CrawlConfig, OutputConfig, PortalConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_portal_config(&config.portal)?;
    validate_crawl_config(&config.crawl)?;
    validate_output_config(&config.output)?;
    validate_user_agent(&config.browser.user_agent)?;
    Ok(())
}

/// Validates portal URLs
fn validate_portal_config(config: &PortalConfig) -> Result<(), ConfigError> {
    validate_http_url("home-url", &config.home_url)?;
    validate_http_url("search-url", &config.search_url)?;
    Ok(())
}

/// Validates search terms and the per-term row bound
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.search_terms.is_empty() {
        return Err(ConfigError::Validation(
            "search-terms must contain at least one term".to_string(),
        ));
    }

    if let Some(position) = config.search_terms.iter().position(|t| t.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "search-terms[{}] is blank",
            position
        )));
    }

    if config.max_rows_per_term < 1 {
        return Err(ConfigError::Validation(format!(
            "max-rows-per-term must be >= 1, got {}",
            config.max_rows_per_term
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.filename_limit < 1 || config.filename_limit > 200 {
        return Err(ConfigError::Validation(format!(
            "filename-limit must be between 1 and 200, got {}",
            config.filename_limit
        )));
    }

    if config.preview_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "preview-limit must be >= 1, got {}",
            config.preview_limit
        )));
    }

    Ok(())
}

fn validate_user_agent(user_agent: &str) -> Result<(), ConfigError> {
    if user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Accepts absolute http(s) URLs only
fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", key, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            key, value
        )));
    }

    Ok(())
}
