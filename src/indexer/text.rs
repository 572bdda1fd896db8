//! Visible text extraction
//!
//! Only text inside a fixed set of text-bearing elements is indexed and
//! used for snippets. Navigation, scripts and markup chrome are ignored.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Elements whose text content is indexed
pub const TEXT_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "b", "strong", "i", "em", "u", "pre", "sup", "sub",
    "small", "address", "mark", "abbr", "kbd", "dfn", "ins", "del", "s", "q", "blockquote", "cite",
    "li",
];

static TEXT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(&TEXT_TAGS.join(", ")).expect("text tag selector is valid")
});

/// Extracts the text of every outermost text-bearing element
///
/// Nested text elements (a `<b>` inside a `<p>`) contribute their text once,
/// through the outermost one. Whitespace inside a segment is collapsed and
/// empty segments are dropped.
///
/// # Example
///
/// ```
/// use sumi_search::indexer::extract_text_segments;
///
/// let html = "<p>The <b>quick</b> fox</p><div>skipped</div><h1>Title</h1>";
/// assert_eq!(extract_text_segments(html), vec!["The quick fox", "Title"]);
/// ```
pub fn extract_text_segments(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    document
        .select(&TEXT_SELECTOR)
        .filter(|element| !has_text_ancestor(element))
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect()
}

fn has_text_ancestor(element: &ElementRef<'_>) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|e| TEXT_TAGS.contains(&e.name()))
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
