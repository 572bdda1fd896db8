//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Error classification

use crate::config::UserAgentConfig;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;

/// A page that answered with any HTTP status
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Page body content
    pub body: String,
}

impl FetchedPage {
    /// True if the status is below 400
    pub fn is_success(&self) -> bool {
        self.status_code < 400
    }

    /// True if the page declares an HTML body, or declares nothing at all
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map_or(true, |ct| ct.to_ascii_lowercase().contains("html"))
    }

    /// True if the page should be parsed for links and indexed
    pub fn is_indexable(&self) -> bool {
        self.is_success() && self.is_html()
    }
}

/// Transport-level fetch failures
///
/// HTTP error statuses are not errors here; they come back as a
/// [`FetchedPage`] with the status code set.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to read body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            FetchError::Body(e.to_string())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout_secs` - Whole-request timeout in seconds
///
/// # Example
///
/// ```no_run
/// use sumi_search::config::UserAgentConfig;
/// use sumi_search::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "SumiSearch".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, 30).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL with a single GET request
///
/// Redirects are followed by the client. Any response that arrives is
/// returned, whatever its status; only transport and body failures are
/// errors.
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage, FetchError> {
    let response = client.get(url).send().await?;

    let status_code = response.status().as_u16();
    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = response.text().await?;

    Ok(FetchedPage {
        final_url,
        status_code,
        content_type,
        body,
    })
}
