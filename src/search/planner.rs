//! Query planning and ranking
//!
//! A query is reduced to its content lemmas. Every lemma contributes the
//! top-ranked index rows of each site it occurs in; a page's relevance is the
//! sum of the ranks it collected. Pages are then highlighted and ordered by a
//! total comparator so paging is stable.

use crate::config::SearchConfig;
use crate::crawler::page_title;
use crate::indexer::{extract_text_segments, IndexGeneration, LemmaExtractor, QueryTerm};
use crate::search::cache::ResultCache;
use crate::search::snippet::{Highlighter, Snippet};
use crate::search::{SearchResult, SearchResults};
use crate::storage::{lock_storage, PageRecord, SharedStorage, SiteRecord, Storage};
use crate::SumiError;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Relevance is compared at this many decimal places so float noise from
/// summing ranks never decides an order
const RELEVANCE_SCALE: f64 = 1e9;

/// A page that matched at least one query lemma
#[derive(Debug, Default)]
struct Candidate {
    relevance: f64,
    /// Indexes into the query terms the page matched
    terms: BTreeSet<usize>,
}

/// A highlighted candidate, ready to sort
struct Ranked {
    page_id: i64,
    snippet: Snippet,
    result: SearchResult,
}

/// Executes search queries against shared storage
pub struct QueryPlanner {
    storage: SharedStorage,
    extractor: Arc<LemmaExtractor>,
    generation: Arc<IndexGeneration>,
    cache: ResultCache,
    config: SearchConfig,
}

impl QueryPlanner {
    pub fn new(
        storage: SharedStorage,
        extractor: Arc<LemmaExtractor>,
        generation: Arc<IndexGeneration>,
        config: SearchConfig,
    ) -> Self {
        Self {
            storage,
            extractor,
            generation,
            cache: ResultCache::new(config.result_cache_size),
            config,
        }
    }

    /// Runs a query
    ///
    /// # Arguments
    ///
    /// * `query` - Raw query text; punctuation is ignored
    /// * `site_id` - Restricts results to one site when set
    /// * `offset` - Number of ranked results to skip
    /// * `limit` - Maximum number of results; 0 selects the configured default
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResults)` - The requested page of results
    /// * `Err(SumiError::EmptyQuery)` - The query has no content words
    pub fn search(
        &self,
        query: &str,
        site_id: Option<i64>,
        offset: usize,
        limit: usize,
    ) -> Result<SearchResults, SumiError> {
        let normalized = normalize_query(query);
        let terms: Vec<QueryTerm> = self
            .extractor
            .query_terms(&normalized)
            .into_iter()
            .filter(|term| !term.is_stop_word)
            .collect();
        if terms.is_empty() {
            return Err(SumiError::EmptyQuery);
        }

        let limit = if limit == 0 {
            self.config.default_limit
        } else {
            limit
        };

        let generation = self.generation.current();
        let ranked = match self.cache.get(&normalized, site_id, generation) {
            Some(results) => {
                tracing::debug!("Cache hit for query '{}'", normalized);
                results
            }
            None => {
                let results = Arc::new(self.rank(&terms, site_id)?);
                self.cache
                    .put(&normalized, site_id, generation, results.clone());
                results
            }
        };

        tracing::debug!("Query '{}' matched {} pages", normalized, ranked.len());

        Ok(SearchResults {
            count: ranked.len(),
            results: ranked.iter().skip(offset).take(limit).cloned().collect(),
        })
    }

    /// Produces every result for the terms, fully ordered
    fn rank(&self, terms: &[QueryTerm], site_id: Option<i64>) -> Result<Vec<SearchResult>, SumiError> {
        let (candidates, pages, sites) = {
            let storage = lock_storage(&self.storage)?;
            let candidates = self.collect_candidates(&*storage, terms, site_id)?;

            let mut pages: HashMap<i64, PageRecord> = HashMap::with_capacity(candidates.len());
            let mut sites: HashMap<i64, SiteRecord> = HashMap::new();
            for page_id in candidates.keys() {
                let page = storage.get_page(*page_id)?;
                if !sites.contains_key(&page.site_id) {
                    sites.insert(page.site_id, storage.get_site(page.site_id)?);
                }
                pages.insert(*page_id, page);
            }
            (candidates, pages, sites)
        };

        // Highlighting parses HTML, so it runs without the storage lock
        let mut ranked = Vec::with_capacity(candidates.len());
        for (page_id, candidate) in candidates {
            let Some(page) = pages.get(&page_id) else {
                continue;
            };
            let Some(site) = sites.get(&page.site_id) else {
                continue;
            };

            let forms: Vec<String> = candidate
                .terms
                .iter()
                .flat_map(|&i| terms[i].word_forms.iter().cloned())
                .collect();
            let Some(highlighter) = Highlighter::new(&forms[..]) else {
                continue;
            };

            let segments = extract_text_segments(&page.content);
            let Some(snippet) =
                highlighter.best_snippet(&segments, self.config.snippet_context_length)
            else {
                tracing::trace!("Page {} has no highlightable text", page_id);
                continue;
            };

            ranked.push(Ranked {
                page_id,
                result: SearchResult {
                    site: site.url.clone(),
                    site_name: site.name.clone(),
                    uri: page.path.clone(),
                    title: page_title(&page.content).unwrap_or_default(),
                    snippet: snippet.text.clone(),
                    relevance: candidate.relevance,
                },
                snippet,
            });
        }

        ranked.sort_by(compare_ranked);
        Ok(ranked.into_iter().map(|r| r.result).collect())
    }

    /// Sums ranks per page over every lemma row of every term
    fn collect_candidates(
        &self,
        storage: &dyn Storage,
        terms: &[QueryTerm],
        site_id: Option<i64>,
    ) -> Result<BTreeMap<i64, Candidate>, SumiError> {
        let mut candidates: BTreeMap<i64, Candidate> = BTreeMap::new();

        for (term_index, term) in terms.iter().enumerate() {
            for lemma in storage.find_lemmas(site_id, &term.lemma)? {
                let rows = storage.find_top_indexes_by_lemma(
                    lemma.id,
                    self.config.max_indexes_per_lemma,
                    site_id,
                )?;
                for row in rows {
                    let candidate = candidates.entry(row.page_id).or_default();
                    candidate.relevance += row.rank;
                    candidate.terms.insert(term_index);
                }
            }
        }

        Ok(candidates)
    }
}

/// Lowercases a query and replaces punctuation with spaces
fn normalize_query(query: &str) -> String {
    query
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn relevance_key(relevance: f64) -> i64 {
    (relevance * RELEVANCE_SCALE).round() as i64
}

/// Best first: relevance, match count and run descending, then the shorter
/// snippet, then the older page
fn compare_ranked(a: &Ranked, b: &Ranked) -> Ordering {
    relevance_key(b.result.relevance)
        .cmp(&relevance_key(a.result.relevance))
        .then(b.snippet.distinct_match_count.cmp(&a.snippet.distinct_match_count))
        .then(b.snippet.max_continuous_run.cmp(&a.snippet.max_continuous_run))
        .then(a.snippet.char_len().cmp(&b.snippet.char_len()))
        .then(a.page_id.cmp(&b.page_id))
}
