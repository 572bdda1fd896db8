//! Output module for presenting index state and query results
//!
//! This module handles:
//! - Collecting per-site indexing statistics
//! - Printing statistics and search results to the console

mod results;
pub mod stats;

pub use results::print_search_results;
pub use stats::{load_statistics, print_statistics, SiteStatistics, StatisticsReport, TotalStatistics};
