//! Lemma extraction
//!
//! Turns text into `lemma -> occurrence count` maps for indexing, and
//! queries into lemma terms carrying the word forms used for highlighting.

use crate::indexer::text::extract_text_segments;
use crate::morphology::Morphology;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("word pattern is valid"));

/// Occurrence count of each lemma, ordered by lemma
pub type LemmaCounts = BTreeMap<String, u32>;

/// One distinct lemma of a search query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerm {
    pub lemma: String,
    pub is_stop_word: bool,
    /// Forms to highlight, including the words literally typed in the query
    pub word_forms: Vec<String>,
}

/// Splits text into lowercased word tokens
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    WORD_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
}

/// Lemmatizes text with a morphology provider
#[derive(Clone)]
pub struct LemmaExtractor {
    morphology: Arc<dyn Morphology>,
}

impl LemmaExtractor {
    pub fn new(morphology: Arc<dyn Morphology>) -> Self {
        Self { morphology }
    }

    /// Counts the non-stop-word lemmas of a text
    pub fn count_text(&self, text: &str) -> LemmaCounts {
        let mut counts = LemmaCounts::new();
        self.add_text(text, &mut counts);
        counts
    }

    /// Counts the lemmas of the indexable text of an HTML document
    pub fn count_html(&self, html: &str) -> LemmaCounts {
        let mut counts = LemmaCounts::new();
        for segment in extract_text_segments(html) {
            self.add_text(&segment, &mut counts);
        }
        counts
    }

    fn add_text(&self, text: &str, counts: &mut LemmaCounts) {
        for token in tokenize(text) {
            let Some(analysis) = self.morphology.analyze(&token) else {
                continue;
            };
            if analysis.is_stop_word {
                continue;
            }
            *counts.entry(analysis.lemma).or_insert(0) += 1;
        }
    }

    /// Groups the words of a query by lemma, in order of first appearance
    ///
    /// Stop words are kept and flagged so callers can tell an all-stop-word
    /// query from an empty one.
    pub fn query_terms(&self, query: &str) -> Vec<QueryTerm> {
        let mut terms: Vec<QueryTerm> = Vec::new();

        for token in tokenize(query) {
            let Some(analysis) = self.morphology.analyze(&token) else {
                continue;
            };

            match terms.iter_mut().find(|t| t.lemma == analysis.lemma) {
                Some(term) => {
                    if !term.word_forms.contains(&token) {
                        term.word_forms.push(token);
                    }
                }
                None => {
                    let mut word_forms = analysis.word_forms;
                    if !word_forms.contains(&token) {
                        word_forms.push(token);
                    }
                    terms.push(QueryTerm {
                        lemma: analysis.lemma,
                        is_stop_word: analysis.is_stop_word,
                        word_forms,
                    });
                }
            }
        }

        terms
    }
}
