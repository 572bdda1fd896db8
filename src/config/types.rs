use serde::Deserialize;

/// Main configuration structure for Sumi-Search
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of concurrent page tasks
    #[serde(rename = "max-concurrent-pages")]
    pub max_concurrent_pages: u32,

    /// Delay before every page fetch (milliseconds)
    #[serde(rename = "politeness-delay", default = "default_politeness_delay")]
    pub politeness_delay: u64,

    /// Total request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Purge each site's pages and index before crawling it again
    #[serde(rename = "fresh-start", default)]
    pub fresh_start: bool,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Query-time configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Upper bound of index rows read per query lemma
    #[serde(rename = "max-indexes-per-lemma")]
    pub max_indexes_per_lemma: u32,

    /// Maximum characters kept from a context segment of a snippet
    #[serde(rename = "snippet-context-length")]
    pub snippet_context_length: usize,

    /// Number of ranked queries kept in the result cache
    #[serde(rename = "result-cache-size")]
    pub result_cache_size: usize,

    /// Page size used when a caller passes a zero limit
    #[serde(rename = "default-limit")]
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_indexes_per_lemma: 1000,
            snippet_context_length: 100,
            result_cache_size: 64,
            default_limit: 20,
        }
    }
}

/// A website to crawl and index
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    /// Root URL of the site (e.g., "https://example.com")
    pub url: String,

    /// Human-readable site name
    pub name: String,
}

fn default_politeness_delay() -> u64 {
    150
}

fn default_request_timeout() -> u64 {
    30
}
