use crate::config::types::{
    Config, CrawlerConfig, SearchConfig, SiteEntry, StorageConfig, UserAgentConfig,
};
use crate::url::site_root;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_storage_config(&config.storage)?;
    validate_search_config(&config.search)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_pages < 1 || config.max_concurrent_pages > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_pages must be between 1 and 100, got {}",
            config.max_concurrent_pages
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
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

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates query-time configuration
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.max_indexes_per_lemma < 1 {
        return Err(ConfigError::Validation(
            "max_indexes_per_lemma must be >= 1".to_string(),
        ));
    }

    if config.snippet_context_length < 10 {
        return Err(ConfigError::Validation(format!(
            "snippet_context_length must be >= 10, got {}",
            config.snippet_context_length
        )));
    }

    if config.result_cache_size < 1 {
        return Err(ConfigError::Validation(
            "result_cache_size must be >= 1".to_string(),
        ));
    }

    if config.default_limit < 1 {
        return Err(ConfigError::Validation(
            "default_limit must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the list of sites to index
///
/// Every site URL must be an http(s) root without query or fragment, every
/// name must be non-empty, and no root may appear twice.
fn validate_sites(sites: &[SiteEntry]) -> Result<(), ConfigError> {
    if sites.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[sites]] entry is required".to_string(),
        ));
    }

    let mut roots = HashSet::new();
    for site in sites {
        let root = site_root(&site.url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid site URL '{}': {}", site.url, e)))?;

        if site.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' must have a name",
                site.url
            )));
        }

        if !roots.insert(root.clone()) {
            return Err(ConfigError::Validation(format!(
                "Site '{}' is configured more than once",
                root
            )));
        }
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
