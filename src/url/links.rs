use crate::url::normalize_path;
use url::Url;

/// Resolves an anchor `href` found on `page_url` into a same-site page path
///
/// Returns None if the link should not be followed:
/// - the raw href carries a fragment (`#`) or a query (`?`)
/// - javascript:, mailto:, tel: and data: links
/// - links that resolve to another scheme, host or port
/// - resolved paths containing `:` or `,`
///
/// # Examples
///
/// ```
/// use sumi_search::url::candidate_path;
/// use url::Url;
///
/// let page = Url::parse("https://example.test/docs/").unwrap();
/// assert_eq!(candidate_path("intro/", &page), Some("/docs/intro".to_string()));
/// assert_eq!(candidate_path("/docs?page=2", &page), None);
/// ```
pub fn candidate_path(href: &str, page_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.contains('#') || href.contains('?') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let resolved = page_url.join(href).ok()?;

    if resolved.scheme() != page_url.scheme()
        || resolved.host_str() != page_url.host_str()
        || resolved.port_or_known_default() != page_url.port_or_known_default()
    {
        return None;
    }

    let path = normalize_path(resolved.path());
    if path.contains(':') || path.contains(',') {
        return None;
    }

    Some(path)
}

/// Checks that a candidate lies strictly below the current page
///
/// This is plain prefix containment: the root page accepts everything under
/// `/`, and a page never accepts itself.
pub fn is_within_subtree(current_path: &str, candidate_path: &str) -> bool {
    candidate_path.starts_with(current_path) && candidate_path.len() > current_path.len()
}
