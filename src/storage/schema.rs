//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Sumi-Search database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Configured sites and their indexing status
CREATE TABLE IF NOT EXISTS sites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    status TEXT NOT NULL,
    status_time TEXT NOT NULL,
    last_error TEXT
);

-- Fetched pages, one row per (site, path)
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id INTEGER NOT NULL REFERENCES sites(id),
    path TEXT NOT NULL,
    http_status INTEGER NOT NULL,
    content TEXT NOT NULL,
    UNIQUE(site_id, path)
);

CREATE INDEX IF NOT EXISTS idx_pages_site ON pages(site_id);

-- Lemmas with the number of distinct pages of the site containing them
CREATE TABLE IF NOT EXISTS lemmas (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id INTEGER NOT NULL REFERENCES sites(id),
    lemma TEXT NOT NULL,
    frequency INTEGER NOT NULL CHECK (frequency > 0),
    UNIQUE(site_id, lemma)
);

CREATE INDEX IF NOT EXISTS idx_lemmas_lemma ON lemmas(lemma);

-- Normalized term weight of a lemma on a page
CREATE TABLE IF NOT EXISTS page_index (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id INTEGER NOT NULL REFERENCES pages(id),
    lemma_id INTEGER NOT NULL REFERENCES lemmas(id),
    rank REAL NOT NULL CHECK (rank > 0 AND rank <= 1),
    UNIQUE(page_id, lemma_id)
);

CREATE INDEX IF NOT EXISTS idx_page_index_lemma_rank ON page_index(lemma_id, rank DESC);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
