//! Configuration module for Sumi-Search
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_search::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Indexing {} sites", config.sites.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, SearchConfig, SiteEntry, StorageConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
