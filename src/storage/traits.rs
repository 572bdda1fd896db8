//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::SiteStatus;
use crate::storage::{IndexRecord, LemmaRecord, PageRecord, SiteRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Site not found: {0}")]
    SiteNotFound(i64),

    #[error("Page not found: {0}")]
    PageNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Frequency changes are single statements so that concurrent indexing of
/// different pages sharing a lemma never loses an update.
pub trait Storage {
    // ===== Sites =====

    /// Finds a site by its root URL
    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>>;

    /// Gets a site by ID
    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord>;

    /// Inserts a site or refreshes an existing one
    ///
    /// The name and status are overwritten, the status time is set to now
    /// and the last error is cleared.
    ///
    /// # Returns
    ///
    /// The site ID (either newly created or existing)
    fn save_site(&mut self, url: &str, name: &str, status: SiteStatus) -> StorageResult<i64>;

    /// Records a status transition with its time and optional error
    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        last_error: Option<&str>,
    ) -> StorageResult<()>;

    /// Lists all sites ordered by ID
    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>>;

    // ===== Pages =====

    /// Finds a page by its site and normalized path
    fn find_page_by_site_and_path(&self, site_id: i64, path: &str)
        -> StorageResult<Option<PageRecord>>;

    /// Gets a page by ID
    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord>;

    /// Inserts a page or overwrites the existing one at the same path
    ///
    /// # Returns
    ///
    /// The page ID (either newly created or existing)
    fn save_page(
        &mut self,
        site_id: i64,
        path: &str,
        http_status: u16,
        content: &str,
    ) -> StorageResult<i64>;

    /// Deletes every page of a site together with its index rows and lemmas
    ///
    /// # Returns
    ///
    /// The number of deleted pages
    fn delete_pages_by_site(&mut self, site_id: i64) -> StorageResult<u64>;

    // ===== Lemmas =====

    /// Inserts a lemma with frequency 1 or increments an existing one
    ///
    /// # Returns
    ///
    /// The lemma ID
    fn upsert_lemma_increment_frequency(&mut self, site_id: i64, lemma: &str)
        -> StorageResult<i64>;

    /// Decrements a lemma's frequency, deleting the row when it reaches zero
    fn decrement_or_delete_lemma(&mut self, site_id: i64, lemma: &str) -> StorageResult<()>;

    /// Finds a lemma in one site, or in every site when `site_id` is None
    fn find_lemmas(&self, site_id: Option<i64>, lemma: &str) -> StorageResult<Vec<LemmaRecord>>;

    // ===== Index rows =====

    /// Gets the current index rows of a page, with their lemma text
    fn find_page_lemmas(&self, page_id: i64) -> StorageResult<Vec<IndexRecord>>;

    /// Inserts or replaces the rank of a (page, lemma) pair
    fn upsert_index(&mut self, page_id: i64, lemma_id: i64, rank: f64) -> StorageResult<()>;

    /// Deletes every index row of a page
    ///
    /// # Returns
    ///
    /// The number of deleted rows
    fn delete_indexes_by_page(&mut self, page_id: i64) -> StorageResult<u64>;

    /// Gets the highest-ranked index rows of a lemma
    ///
    /// Rows are ordered by rank descending, then page ID, and restricted to
    /// pages of `site_id` when one is given.
    fn find_top_indexes_by_lemma(
        &self,
        lemma_id: i64,
        limit: u32,
        site_id: Option<i64>,
    ) -> StorageResult<Vec<IndexRecord>>;

    // ===== Transactions =====

    /// Starts a transaction covering the following writes
    fn begin_transaction(&mut self) -> StorageResult<()>;

    /// Commits the open transaction
    fn commit_transaction(&mut self) -> StorageResult<()>;

    /// Rolls back the open transaction
    fn rollback_transaction(&mut self) -> StorageResult<()>;

    // ===== Statistics =====

    /// Counts all sites
    fn count_sites(&self) -> StorageResult<u64>;

    /// Counts all pages
    fn count_pages(&self) -> StorageResult<u64>;

    /// Counts all lemmas
    fn count_lemmas(&self) -> StorageResult<u64>;

    /// Counts the pages of one site
    fn count_pages_by_site(&self, site_id: i64) -> StorageResult<u64>;

    /// Counts the lemmas of one site
    fn count_lemmas_by_site(&self, site_id: i64) -> StorageResult<u64>;
}
