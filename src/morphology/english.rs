//! Rule-based English analyzer
//!
//! Irregular forms come from a fixed table. Regular forms are reduced by
//! suffix rules for plurals and the `-ing`/`-ed` verb endings, which are
//! also used in reverse to enumerate the forms of a lemma.

use super::{Morphology, WordAnalysis};
use std::collections::{HashMap, HashSet};

/// Articles, pronouns, prepositions, conjunctions, particles, interjections
/// and the fragments left behind when contractions are split on the
/// apostrophe
const STOP_WORDS: &[&str] = &[
    // articles
    "a", "an", "the",
    // pronouns
    "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself",
    "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "we", "us", "our", "ours", "ourselves", "they",
    "them", "their", "theirs", "themselves", "this", "these", "those", "which",
    "who", "whom", "whose", "what", "whatever", "whichever", "whoever",
    "anybody", "anyone", "anything", "everybody", "everyone", "everything",
    "nobody", "none", "nothing", "somebody", "someone", "something", "each",
    "another",
    // prepositions
    "about", "above", "across", "after", "against", "along", "amid", "among",
    "around", "at", "before", "behind", "below", "beneath", "beside", "besides",
    "between", "beyond", "by", "concerning", "despite", "down", "during",
    "except", "for", "from", "in", "inside", "into", "near", "of", "off", "on",
    "onto", "out", "outside", "over", "per", "since", "through", "throughout",
    "till", "to", "toward", "towards", "under", "underneath", "until", "unto",
    "up", "upon", "via", "with", "within", "without",
    // conjunctions
    "although", "and", "as", "because", "but", "either", "if", "lest", "neither",
    "nor", "once", "or", "so", "than", "that", "though", "unless", "whereas",
    "whether", "while", "yet",
    // particles
    "not", "no", "only", "just", "even", "also", "too", "very",
    // interjections
    "ah", "aha", "alas", "eh", "hey", "hi", "hmm", "oh", "oops", "ouch", "uh",
    "um", "wow",
    // contraction fragments
    "d", "ll", "m", "re", "s", "t", "ve", "aren", "couldn", "didn", "doesn",
    "don", "hadn", "hasn", "haven", "isn", "mustn", "needn", "shan", "shouldn",
    "wasn", "weren", "wouldn",
];

/// (form, lemma) pairs the suffix rules get wrong
const IRREGULAR_FORMS: &[(&str, &str)] = &[
    ("am", "be"), ("are", "be"), ("is", "be"), ("was", "be"), ("were", "be"),
    ("been", "be"), ("being", "be"),
    ("has", "have"), ("had", "have"), ("having", "have"),
    ("does", "do"), ("did", "do"), ("done", "do"),
    ("goes", "go"), ("went", "go"), ("gone", "go"),
    ("children", "child"), ("men", "man"), ("women", "woman"),
    ("people", "person"), ("mice", "mouse"), ("feet", "foot"),
    ("teeth", "tooth"), ("geese", "goose"),
    ("better", "good"), ("best", "good"), ("worse", "bad"), ("worst", "bad"),
    ("ate", "eat"), ("eaten", "eat"),
    ("began", "begin"), ("begun", "begin"),
    ("bought", "buy"), ("brought", "bring"), ("built", "build"),
    ("came", "come"), ("chose", "choose"), ("chosen", "choose"),
    ("drove", "drive"), ("driven", "drive"),
    ("felt", "feel"), ("flew", "fly"), ("flown", "fly"), ("found", "find"),
    ("gave", "give"), ("given", "give"), ("got", "get"), ("gotten", "get"),
    ("grew", "grow"), ("grown", "grow"), ("held", "hold"),
    ("kept", "keep"), ("knew", "know"), ("known", "know"),
    ("led", "lead"), ("left", "leave"), ("lost", "lose"),
    ("made", "make"), ("met", "meet"), ("paid", "pay"),
    ("ran", "run"), ("said", "say"), ("sat", "sit"), ("saw", "see"),
    ("seen", "see"), ("sent", "send"), ("sold", "sell"),
    ("spoke", "speak"), ("spoken", "speak"), ("stood", "stand"),
    ("taken", "take"), ("took", "take"), ("taught", "teach"),
    ("thought", "think"), ("threw", "throw"), ("thrown", "throw"),
    ("told", "tell"), ("understood", "understand"), ("won", "win"),
    ("wrote", "write"), ("written", "write"),
];

/// English analyzer backed by static tables
pub struct EnglishMorphology {
    stop_words: HashSet<&'static str>,
    irregular: HashMap<&'static str, &'static str>,
    irregular_forms: HashMap<&'static str, Vec<&'static str>>,
}

impl EnglishMorphology {
    pub fn new() -> Self {
        let mut irregular_forms: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
        for (form, lemma) in IRREGULAR_FORMS {
            irregular_forms.entry(lemma).or_default().push(form);
        }

        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
            irregular: IRREGULAR_FORMS.iter().copied().collect(),
            irregular_forms,
        }
    }

    fn lemmatize(&self, word: &str) -> String {
        if let Some(lemma) = self.irregular.get(word) {
            return (*lemma).to_string();
        }
        reduce_suffix(word)
    }

    fn word_forms(&self, lemma: &str) -> Vec<String> {
        let mut forms = vec![lemma.to_string()];
        forms.extend(regular_forms(lemma));
        if let Some(irregular) = self.irregular_forms.get(lemma) {
            forms.extend(irregular.iter().map(|f| f.to_string()));
        }

        let mut seen = HashSet::new();
        forms.retain(|f| seen.insert(f.clone()));
        forms
    }
}

impl Default for EnglishMorphology {
    fn default() -> Self {
        Self::new()
    }
}

impl Morphology for EnglishMorphology {
    fn language(&self) -> &'static str {
        "en"
    }

    fn analyze(&self, word: &str) -> Option<WordAnalysis> {
        if word.is_empty() {
            return None;
        }
        let word = word.to_lowercase();

        if !word.chars().any(char::is_alphabetic) {
            return Some(WordAnalysis {
                lemma: word.clone(),
                is_stop_word: true,
                word_forms: vec![word],
            });
        }

        // Mixed alphanumerics and non-Latin scripts are kept as they are
        if !word.chars().all(|c| c.is_ascii_alphabetic()) {
            return Some(WordAnalysis {
                lemma: word.clone(),
                is_stop_word: false,
                word_forms: vec![word],
            });
        }

        if self.stop_words.contains(word.as_str()) {
            return Some(WordAnalysis {
                lemma: word.clone(),
                is_stop_word: true,
                word_forms: vec![word],
            });
        }

        let lemma = self.lemmatize(&word);
        let word_forms = self.word_forms(&lemma);
        Some(WordAnalysis {
            lemma,
            is_stop_word: false,
            word_forms,
        })
    }
}

fn is_vowel(c: u8) -> bool {
    matches!(c, b'a' | b'e' | b'i' | b'o' | b'u')
}

fn has_vowel(stem: &str) -> bool {
    stem.bytes().any(|c| is_vowel(c) || c == b'y')
}

/// Consonant-vowel-consonant stem like "hop" or "run"
fn is_short_cvc(stem: &str) -> bool {
    let b = stem.as_bytes();
    b.len() == 3
        && !is_vowel(b[0])
        && is_vowel(b[1])
        && !is_vowel(b[2])
        && !matches!(b[2], b'w' | b'x' | b'y')
}

fn reduce_suffix(word: &str) -> String {
    if word.len() <= 3 {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        if stem.len() >= 2 {
            return format!("{}y", stem);
        }
    }
    if word.ends_with("sses") {
        return word[..word.len() - 2].to_string();
    }
    for suffix in ["xes", "ches", "shes", "zzes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix('s') {
        return stem.to_string();
    }

    if word.len() > 5 {
        if let Some(stem) = word.strip_suffix("ing") {
            if has_vowel(stem) {
                return restore_stem(stem);
            }
        }
    }
    if word.len() > 4 && !word.ends_with("eed") {
        if let Some(stem) = word.strip_suffix("ed") {
            if has_vowel(stem) {
                return restore_stem(stem);
            }
        }
    }

    word.to_string()
}

/// Undoes the spelling changes made when a verb suffix was attached
fn restore_stem(stem: &str) -> String {
    if stem.ends_with("at") || stem.ends_with("bl") || stem.ends_with("iz") {
        return format!("{}e", stem);
    }

    let b = stem.as_bytes();
    if b.len() >= 2 {
        let last = b[b.len() - 1];
        if last == b[b.len() - 2] && !is_vowel(last) && !matches!(last, b'l' | b's' | b'z') {
            return stem[..stem.len() - 1].to_string();
        }
    }

    if is_short_cvc(stem) {
        return format!("{}e", stem);
    }

    stem.to_string()
}

/// Plural, `-ing` and `-ed` forms of a regular lemma
fn regular_forms(lemma: &str) -> Vec<String> {
    let b = lemma.as_bytes();
    let mut forms = Vec::new();

    let consonant_y = b.len() >= 2 && b[b.len() - 1] == b'y' && !is_vowel(b[b.len() - 2]);
    let silent_e = lemma.ends_with('e') && !lemma.ends_with("ee");

    // plural / third person
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| lemma.ends_with(s)) {
        forms.push(format!("{}es", lemma));
    } else if consonant_y {
        forms.push(format!("{}ies", &lemma[..lemma.len() - 1]));
    } else {
        forms.push(format!("{}s", lemma));
    }

    // progressive
    if silent_e {
        forms.push(format!("{}ing", &lemma[..lemma.len() - 1]));
    } else {
        forms.push(format!("{}ing", lemma));
    }

    // past
    if silent_e {
        forms.push(format!("{}d", lemma));
    } else if consonant_y {
        forms.push(format!("{}ied", &lemma[..lemma.len() - 1]));
    } else {
        forms.push(format!("{}ed", lemma));
    }

    if is_short_cvc(lemma) {
        let last = &lemma[lemma.len() - 1..];
        forms.push(format!("{}{}ing", lemma, last));
        forms.push(format!("{}{}ed", lemma, last));
    }

    forms
}
