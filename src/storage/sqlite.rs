//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::SiteStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{IndexRecord, LemmaRecord, PageRecord, SiteRecord};
use crate::SumiError;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const SITE_COLUMNS: &str = "id, url, name, status, status_time, last_error";
const PAGE_COLUMNS: &str = "id, site_id, path, http_status, content";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SumiError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SumiError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            PRAGMA mmap_size = 268435456;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, SumiError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Runs `f` inside a savepoint, which nests inside an open transaction
    fn with_savepoint<T>(
        &mut self,
        name: &str,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> StorageResult<T> {
        self.conn.execute_batch(&format!("SAVEPOINT {}", name))?;
        match f(&self.conn) {
            Ok(value) => {
                self.conn.execute_batch(&format!("RELEASE {}", name))?;
                Ok(value)
            }
            Err(e) => {
                self.conn
                    .execute_batch(&format!("ROLLBACK TO {0}; RELEASE {0}", name))?;
                Err(e.into())
            }
        }
    }
}

/// Current time truncated to whole seconds, formatted for storage
fn timestamp_now() -> String {
    Utc::now()
        .trunc_subsecs(0)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn site_from_row(row: &Row<'_>) -> rusqlite::Result<SiteRecord> {
    let status: String = row.get(3)?;
    let status_time: String = row.get(4)?;
    Ok(SiteRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        status: SiteStatus::from_db_string(&status).unwrap_or(SiteStatus::Failed),
        status_time: parse_timestamp(4, &status_time)?,
        last_error: row.get(5)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        path: row.get(2)?,
        http_status: row.get(3)?,
        content: row.get(4)?,
    })
}

fn index_from_row(row: &Row<'_>) -> rusqlite::Result<IndexRecord> {
    Ok(IndexRecord {
        page_id: row.get(0)?,
        lemma_id: row.get(1)?,
        lemma: row.get(2)?,
        rank: row.get(3)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Sites =====

    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>> {
        let site = self
            .conn
            .query_row(
                &format!("SELECT {} FROM sites WHERE url = ?1", SITE_COLUMNS),
                params![url],
                site_from_row,
            )
            .optional()?;
        Ok(site)
    }

    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM sites WHERE id = ?1", SITE_COLUMNS),
                params![site_id],
                site_from_row,
            )
            .optional()?
            .ok_or(StorageError::SiteNotFound(site_id))
    }

    fn save_site(&mut self, url: &str, name: &str, status: SiteStatus) -> StorageResult<i64> {
        let id = self.conn.query_row(
            "INSERT INTO sites (url, name, status, status_time, last_error) VALUES (?1, ?2, ?3, ?4, NULL)
             ON CONFLICT(url) DO UPDATE SET name = excluded.name, status = excluded.status,
             status_time = excluded.status_time, last_error = NULL
             RETURNING id",
            params![url, name, status.to_db_string(), timestamp_now()],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        last_error: Option<&str>,
    ) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE sites SET status = ?1, status_time = ?2, last_error = ?3 WHERE id = ?4",
            params![status.to_db_string(), timestamp_now(), last_error, site_id],
        )?;
        if updated == 0 {
            return Err(StorageError::SiteNotFound(site_id));
        }
        Ok(())
    }

    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM sites ORDER BY id", SITE_COLUMNS))?;

        let sites = stmt
            .query_map([], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sites)
    }

    // ===== Pages =====

    fn find_page_by_site_and_path(
        &self,
        site_id: i64,
        path: &str,
    ) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM pages WHERE site_id = ?1 AND path = ?2",
                    PAGE_COLUMNS
                ),
                params![site_id, path],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE id = ?1", PAGE_COLUMNS),
                params![page_id],
                page_from_row,
            )
            .optional()?
            .ok_or(StorageError::PageNotFound(page_id))
    }

    fn save_page(
        &mut self,
        site_id: i64,
        path: &str,
        http_status: u16,
        content: &str,
    ) -> StorageResult<i64> {
        // The upsert makes concurrent discovery of the same path benign
        let id = self.conn.query_row(
            "INSERT INTO pages (site_id, path, http_status, content) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(site_id, path) DO UPDATE SET http_status = excluded.http_status,
             content = excluded.content
             RETURNING id",
            params![site_id, path, http_status, content],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn delete_pages_by_site(&mut self, site_id: i64) -> StorageResult<u64> {
        self.with_savepoint("purge_site", |conn| {
            conn.execute(
                "DELETE FROM page_index WHERE page_id IN (SELECT id FROM pages WHERE site_id = ?1)",
                params![site_id],
            )?;
            conn.execute("DELETE FROM lemmas WHERE site_id = ?1", params![site_id])?;
            let pages = conn.execute("DELETE FROM pages WHERE site_id = ?1", params![site_id])?;
            Ok(pages as u64)
        })
    }

    // ===== Lemmas =====

    fn upsert_lemma_increment_frequency(
        &mut self,
        site_id: i64,
        lemma: &str,
    ) -> StorageResult<i64> {
        let id = self.conn.query_row(
            "INSERT INTO lemmas (site_id, lemma, frequency) VALUES (?1, ?2, 1)
             ON CONFLICT(site_id, lemma) DO UPDATE SET frequency = frequency + 1
             RETURNING id",
            params![site_id, lemma],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn decrement_or_delete_lemma(&mut self, site_id: i64, lemma: &str) -> StorageResult<()> {
        let deleted = self.conn.execute(
            "DELETE FROM lemmas WHERE site_id = ?1 AND lemma = ?2 AND frequency <= 1",
            params![site_id, lemma],
        )?;
        if deleted == 0 {
            self.conn.execute(
                "UPDATE lemmas SET frequency = frequency - 1 WHERE site_id = ?1 AND lemma = ?2",
                params![site_id, lemma],
            )?;
        }
        Ok(())
    }

    fn find_lemmas(&self, site_id: Option<i64>, lemma: &str) -> StorageResult<Vec<LemmaRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, site_id, lemma, frequency FROM lemmas
             WHERE lemma = ?1 AND (?2 IS NULL OR site_id = ?2)
             ORDER BY site_id",
        )?;

        let lemmas = stmt
            .query_map(params![lemma, site_id], |row| {
                Ok(LemmaRecord {
                    id: row.get(0)?,
                    site_id: row.get(1)?,
                    lemma: row.get(2)?,
                    frequency: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(lemmas)
    }

    // ===== Index rows =====

    fn find_page_lemmas(&self, page_id: i64) -> StorageResult<Vec<IndexRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.page_id, i.lemma_id, l.lemma, i.rank
             FROM page_index i JOIN lemmas l ON l.id = i.lemma_id
             WHERE i.page_id = ?1
             ORDER BY l.lemma",
        )?;

        let rows = stmt
            .query_map(params![page_id], index_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn upsert_index(&mut self, page_id: i64, lemma_id: i64, rank: f64) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO page_index (page_id, lemma_id, rank) VALUES (?1, ?2, ?3)
             ON CONFLICT(page_id, lemma_id) DO UPDATE SET rank = excluded.rank",
            params![page_id, lemma_id, rank],
        )?;
        Ok(())
    }

    fn delete_indexes_by_page(&mut self, page_id: i64) -> StorageResult<u64> {
        let deleted = self
            .conn
            .execute("DELETE FROM page_index WHERE page_id = ?1", params![page_id])?;
        Ok(deleted as u64)
    }

    fn find_top_indexes_by_lemma(
        &self,
        lemma_id: i64,
        limit: u32,
        site_id: Option<i64>,
    ) -> StorageResult<Vec<IndexRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.page_id, i.lemma_id, l.lemma, i.rank
             FROM page_index i
             JOIN lemmas l ON l.id = i.lemma_id
             JOIN pages p ON p.id = i.page_id
             WHERE i.lemma_id = ?1 AND (?2 IS NULL OR p.site_id = ?2)
             ORDER BY i.rank DESC, i.page_id ASC
             LIMIT ?3",
        )?;

        let rows = stmt
            .query_map(params![lemma_id, site_id, limit], index_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    // ===== Transactions =====

    fn begin_transaction(&mut self) -> StorageResult<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit_transaction(&mut self) -> StorageResult<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback_transaction(&mut self) -> StorageResult<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    // ===== Statistics =====

    fn count_sites(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sites", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_pages(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_lemmas(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM lemmas", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_pages_by_site(&self, site_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE site_id = ?1",
            params![site_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_lemmas_by_site(&self, site_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM lemmas WHERE site_id = ?1",
            params![site_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
