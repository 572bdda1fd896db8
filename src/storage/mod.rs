//! Storage module for persisting sites, pages and the lemma index
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Site status persistence
//! - Page content storage
//! - Per-site lemma frequencies and per-page index rows

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::SiteStatus;
use crate::SumiError;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage handle shared between crawl tasks and query execution
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(SumiError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SumiError> {
    SqliteStorage::new(path)
}

/// Locks shared storage, turning a poisoned lock into a storage error
pub fn lock_storage(storage: &SharedStorage) -> StorageResult<MutexGuard<'_, SqliteStorage>> {
    storage.lock().map_err(|_| StorageError::LockPoisoned)
}

/// Represents a site in the database
#[derive(Debug, Clone)]
pub struct SiteRecord {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    pub status_time: DateTime<Utc>,
    pub last_error: Option<String>,
}

/// Represents a fetched page in the database
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub id: i64,
    pub site_id: i64,
    pub path: String,
    pub http_status: u16,
    pub content: String,
}

/// Represents a lemma and its per-site page frequency
#[derive(Debug, Clone, PartialEq)]
pub struct LemmaRecord {
    pub id: i64,
    pub site_id: i64,
    pub lemma: String,
    pub frequency: u32,
}

/// Represents one (page, lemma, rank) index row
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    pub page_id: i64,
    pub lemma_id: i64,
    pub lemma: String,
    pub rank: f64,
}
