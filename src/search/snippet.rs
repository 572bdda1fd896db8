//! Snippet generation
//!
//! A snippet is one text segment of a page with every occurrence of the
//! query's word forms wrapped in `<b>..</b>` and the text between matches
//! shortened to a bounded context.

use regex::{Regex, RegexBuilder};

const ELLIPSIS: &str = "...";

/// A highlighted excerpt and the metrics used to rank it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub text: String,
    /// Number of highlighted intervals
    pub distinct_match_count: usize,
    /// Largest number of intervals separated only by whitespace
    pub max_continuous_run: usize,
}

impl Snippet {
    /// Length of the snippet text in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Case-insensitive, word-bounded matcher for a set of word forms
pub struct Highlighter {
    pattern: Regex,
}

impl Highlighter {
    /// Builds a matcher, or None if there is nothing to match
    pub fn new<S: AsRef<str>>(forms: &[S]) -> Option<Self> {
        let mut forms: Vec<&str> = forms
            .iter()
            .map(|f| f.as_ref())
            .filter(|f| !f.is_empty())
            .collect();
        if forms.is_empty() {
            return None;
        }

        // Longest first so a form never shadows a longer one at the same start
        forms.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        forms.dedup();

        let alternation = forms
            .iter()
            .map(|f| regex::escape(f))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
            .case_insensitive(true)
            .build()
            .ok()?;

        Some(Self { pattern })
    }

    /// Byte spans of every match in `text`, merged
    pub fn find(&self, text: &str) -> Vec<(usize, usize)> {
        merge_intervals(
            self.pattern
                .find_iter(text)
                .map(|m| (m.start(), m.end()))
                .collect(),
        )
    }

    /// Highlights one text segment
    ///
    /// Returns None if nothing in the segment matches.
    pub fn snippet(&self, text: &str, context_length: usize) -> Option<Snippet> {
        let intervals = self.find(text);
        if intervals.is_empty() {
            return None;
        }

        let mut out = String::with_capacity(text.len().min(context_length * 4));
        let mut pos = 0;
        let mut run = 1;
        let mut max_run = 1;

        for (i, &(start, end)) in intervals.iter().enumerate() {
            let context = &text[pos..start];
            if i == 0 {
                out.push_str(&keep_tail(context, context_length));
            } else {
                if context.chars().all(char::is_whitespace) {
                    run += 1;
                    max_run = max_run.max(run);
                } else {
                    run = 1;
                }
                out.push_str(&keep_both(context, context_length));
            }

            out.push_str("<b>");
            out.push_str(&text[start..end]);
            out.push_str("</b>");
            pos = end;
        }
        out.push_str(&keep_head(&text[pos..], context_length));

        Some(Snippet {
            text: out,
            distinct_match_count: intervals.len(),
            max_continuous_run: max_run,
        })
    }

    /// The best snippet among a page's text segments
    ///
    /// Segments are compared by match count, then longest run, then the
    /// shorter text.
    pub fn best_snippet(&self, segments: &[String], context_length: usize) -> Option<Snippet> {
        segments
            .iter()
            .filter_map(|segment| self.snippet(segment, context_length))
            .min_by(|a, b| {
                b.distinct_match_count
                    .cmp(&a.distinct_match_count)
                    .then(b.max_continuous_run.cmp(&a.max_continuous_run))
                    .then(a.char_len().cmp(&b.char_len()))
            })
    }
}

/// Sorts spans and merges the ones that overlap or touch
///
/// Spans sharing a start keep the larger end.
pub fn merge_intervals(mut spans: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(i, _)| i)
}

/// First `max` characters, cut back to a whitespace boundary
fn head_part(text: &str, max: usize) -> &str {
    let end = byte_offset(text, max);
    let head = &text[..end];
    if text[end..].starts_with(|c: char| !c.is_whitespace()) {
        head.trim_end_matches(|c: char| !c.is_whitespace())
    } else {
        head
    }
}

/// Last `max` characters, cut forward to a whitespace boundary
fn tail_part(text: &str, max: usize) -> &str {
    let count = text.chars().count();
    let start = byte_offset(text, count.saturating_sub(max));
    let tail = &text[start..];
    if start > 0 && !text[..start].ends_with(char::is_whitespace) {
        tail.trim_start_matches(|c: char| !c.is_whitespace())
    } else {
        tail
    }
}

fn keep_tail(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    format!("{} {}", ELLIPSIS, tail_part(text, max).trim_start())
}

fn keep_head(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    format!("{} {}", head_part(text, max).trim_end(), ELLIPSIS)
}

fn keep_both(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let half = max / 2;
    format!(
        "{} {} {}",
        head_part(text, half).trim_end(),
        ELLIPSIS,
        tail_part(text, half).trim_start()
    )
}
