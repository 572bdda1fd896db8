//! URL handling module for Sumi-Search
//!
//! This module normalizes site and page URLs and decides which discovered
//! links stay inside a site's crawl.

mod links;
mod normalize;

// Re-export main functions
pub use links::{candidate_path, is_within_subtree};
pub use normalize::{normalize_path, site_root, split_page_url};
