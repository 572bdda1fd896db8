//! Query execution
//!
//! This module answers full-text queries over the lemma index:
//! - Query lemmatization and word-form expansion
//! - Relevance ranking from per-page lemma ranks
//! - Snippet highlighting
//! - Caching of ranked result lists

mod cache;
mod planner;
mod snippet;

pub use cache::ResultCache;
pub use planner::QueryPlanner;
pub use snippet::{merge_intervals, Highlighter, Snippet};

use serde::Serialize;

/// One ranked page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Root URL of the page's site
    pub site: String,
    pub site_name: String,
    /// Path of the page below the site root
    pub uri: String,
    pub title: String,
    /// Highlighted excerpt
    pub snippet: String,
    /// Sum of the page's ranks for the matched lemmas
    pub relevance: f64,
}

/// A page of ranked results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    /// Number of ranked results before offset and limit were applied
    pub count: usize,
    pub results: Vec<SearchResult>,
}
