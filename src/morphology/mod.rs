//! Morphological analysis
//!
//! Maps words to their dictionary form (lemma), marks function words and
//! enumerates the surface forms a lemma can take in text.

mod english;

pub use english::EnglishMorphology;

use std::sync::{Arc, LazyLock};

/// Result of analyzing a single word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordAnalysis {
    /// Dictionary form of the word
    pub lemma: String,

    /// True for articles, pronouns, prepositions, conjunctions, particles,
    /// interjections and contraction fragments, which are never indexed
    pub is_stop_word: bool,

    /// Every inflected form of the lemma, including the lemma itself
    pub word_forms: Vec<String>,
}

/// A language analyzer
///
/// Implementations must be safe to share between crawl tasks and queries.
pub trait Morphology: Send + Sync {
    /// Short language tag, e.g. "en"
    fn language(&self) -> &'static str;

    /// Analyzes a lowercased word
    ///
    /// Returns None when the word is not something the analyzer can
    /// handle at all (empty input).
    fn analyze(&self, word: &str) -> Option<WordAnalysis>;
}

static DEFAULT: LazyLock<Arc<EnglishMorphology>> =
    LazyLock::new(|| Arc::new(EnglishMorphology::new()));

/// Returns the process-wide default analyzer
pub fn default_morphology() -> Arc<dyn Morphology> {
    DEFAULT.clone()
}
