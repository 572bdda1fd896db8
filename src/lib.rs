//! Sumi-Search: a lemma-indexing site search engine
//!
//! This crate crawls a configured set of websites, indexes the visible text of
//! every page by linguistic lemma, and answers ranked full-text queries with
//! highlighted snippets.

pub mod config;
pub mod crawler;
pub mod engine;
pub mod indexer;
pub mod morphology;
pub mod output;
pub mod search;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Search operations
#[derive(Debug, Error)]
pub enum SumiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Search query is empty")]
    EmptyQuery,

    #[error("Site is not configured: {0}")]
    UnknownSite(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Sumi-Search operations
pub type Result<T> = std::result::Result<T, SumiError>;

// Re-export commonly used types
pub use config::Config;
pub use engine::SearchEngine;
pub use search::{SearchResult, SearchResults};
pub use state::SiteStatus;
