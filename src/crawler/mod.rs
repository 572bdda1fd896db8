//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and error classification
//! - HTML parsing and link extraction
//! - Concurrency limiting, visited tracking and cancellation
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::{Coordinator, PageTask, INTERRUPTED_MESSAGE};
pub use fetcher::{build_http_client, fetch_page, FetchError, FetchedPage};
pub use parser::{page_links, page_title};
pub use scheduler::{ActiveTask, CrawlRun};
