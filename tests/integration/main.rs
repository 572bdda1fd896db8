//! Integration tests for Sumi-Search
//!
//! These tests use wiremock to serve small sites and drive the engine
//! through full crawl, index and search cycles.

mod common;
mod crawl_tests;
mod search_tests;
