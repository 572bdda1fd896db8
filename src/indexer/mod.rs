//! Page indexing
//!
//! This module turns fetched HTML into per-page lemma index rows:
//! - Visible text extraction from text-bearing elements
//! - Tokenizing and lemmatizing through a morphology provider
//! - Transactional replacement of a page's index rows

mod builder;
mod lemmas;
mod text;

pub use builder::{index_page, IndexOutcome};
pub use lemmas::{tokenize, LemmaCounts, LemmaExtractor, QueryTerm};
pub use text::{extract_text_segments, TEXT_TAGS};

use crate::storage::{lock_storage, SharedStorage, Storage, StorageResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counter bumped on every committed index change
///
/// Query results cached under an older generation are stale.
#[derive(Debug, Default)]
pub struct IndexGeneration(AtomicU64);

impl IndexGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Indexes pages into shared storage
#[derive(Clone)]
pub struct Indexer {
    storage: SharedStorage,
    extractor: Arc<LemmaExtractor>,
    generation: Arc<IndexGeneration>,
}

impl Indexer {
    pub fn new(
        storage: SharedStorage,
        extractor: Arc<LemmaExtractor>,
        generation: Arc<IndexGeneration>,
    ) -> Self {
        Self {
            storage,
            extractor,
            generation,
        }
    }

    /// Replaces the index of a page with the lemmas of its HTML
    pub fn index_html(&self, site_id: i64, page_id: i64, html: &str) -> StorageResult<IndexOutcome> {
        // Parsing happens before the lock is taken
        let counts = self.extractor.count_html(html);
        self.apply(site_id, page_id, &counts)
    }

    /// Removes a page from the index, e.g. after it started returning errors
    pub fn clear_page(&self, site_id: i64, page_id: i64) -> StorageResult<IndexOutcome> {
        self.apply(site_id, page_id, &LemmaCounts::new())
    }

    /// Deletes every page of a site along with its lemmas and index rows
    pub fn purge_site(&self, site_id: i64) -> StorageResult<u64> {
        let purged = {
            let mut storage = lock_storage(&self.storage)?;
            storage.delete_pages_by_site(site_id)?
        };
        self.generation.bump();

        tracing::debug!("Purged {} pages of site {}", purged, site_id);
        Ok(purged)
    }

    fn apply(&self, site_id: i64, page_id: i64, counts: &LemmaCounts) -> StorageResult<IndexOutcome> {
        let outcome = {
            let mut storage = lock_storage(&self.storage)?;
            index_page(&mut *storage, site_id, page_id, counts)?
        };
        self.generation.bump();

        tracing::debug!(
            "Indexed page {}: {} added, {} removed, {} retained",
            page_id,
            outcome.added,
            outcome.removed,
            outcome.retained
        );
        Ok(outcome)
    }
}
