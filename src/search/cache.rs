//! Query result cache
//!
//! Fully ranked result lists are cached per (query, site filter) so paging
//! through results does not re-rank. Entries remember the index generation
//! they were computed under and are ignored once the index changes.

use crate::search::SearchResult;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    query: String,
    site_id: Option<i64>,
}

struct CachedResults {
    generation: u64,
    results: Arc<Vec<SearchResult>>,
}

/// LRU cache of ranked result lists
pub struct ResultCache {
    entries: Mutex<LruCache<CacheKey, CachedResults>>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns cached results computed under `generation`
    pub fn get(
        &self,
        query: &str,
        site_id: Option<i64>,
        generation: u64,
    ) -> Option<Arc<Vec<SearchResult>>> {
        let key = CacheKey {
            query: query.to_string(),
            site_id,
        };
        let mut entries = self.entries.lock().ok()?;

        let lookup = entries
            .get(&key)
            .map(|cached| (cached.generation == generation).then(|| cached.results.clone()));

        match lookup {
            Some(Some(results)) => Some(results),
            Some(None) => {
                entries.pop(&key);
                None
            }
            None => None,
        }
    }

    pub fn put(
        &self,
        query: &str,
        site_id: Option<i64>,
        generation: u64,
        results: Arc<Vec<SearchResult>>,
    ) {
        let key = CacheKey {
            query: query.to_string(),
            site_id,
        };
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(key, CachedResults { generation, results });
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
