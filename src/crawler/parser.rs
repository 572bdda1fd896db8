//! HTML helpers for extracting links and the page title
//!
//! Links are returned as raw `href` values; deciding which of them belong to
//! the crawl is done by [`crate::url::candidate_path`].

use scraper::{Html, Selector};

/// Raw `href` values of a page's anchors, in document order
///
/// Anchors carrying the `download` attribute are skipped.
///
/// # Example
///
/// ```
/// use sumi_search::crawler::page_links;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// assert_eq!(page_links(html), vec!["/page".to_string()]);
/// ```
pub fn page_links(html: &str) -> Vec<String> {
    extract_links(&Html::parse_document(html))
}

/// Returns the trimmed `<title>` of a stored page, if it has one
pub fn page_title(html: &str) -> Option<String> {
    extract_title(&Html::parse_document(html))
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts every anchor href from the HTML document
fn extract_links(document: &Html) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>Test Page</title></head><body></body></html>"#;
        assert_eq!(page_title(html), Some("Test Page".to_string()));
    }

    #[test]
    fn test_extract_title_with_whitespace() {
        let html = r#"<html><head><title>  Test Page  </title></head><body></body></html>"#;
        assert_eq!(page_title(html), Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let html = r#"<html><head></head><body></body></html>"#;
        assert_eq!(page_title(html), None);
    }

    #[test]
    fn test_links_are_raw_hrefs() {
        let html = r#"
            <html>
            <body>
                <a href="/page1">Link 1</a>
                <a href=" page2 ">Link 2</a>
                <a href="https://other.com/page3">Link 3</a>
                <a href="mailto:test@example.com">Mail</a>
            </body>
            </html>
        "#;
        assert_eq!(
            page_links(html),
            vec!["/page1", "page2", "https://other.com/page3", "mailto:test@example.com"]
        );
    }

    #[test]
    fn test_skip_download_link() {
        let html = r#"<html><body><a href="/file.pdf" download>Download</a></body></html>"#;
        assert!(page_links(html).is_empty());
    }

    #[test]
    fn test_skip_empty_href() {
        let html = r#"<html><body><a href="">Nothing</a><a name="x">Anchor</a></body></html>"#;
        assert!(page_links(html).is_empty());
    }
}
