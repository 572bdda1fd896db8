use crate::UrlError;
use url::Url;

/// Normalizes a configured site URL to its root form
///
/// A site is identified by `scheme://host[:port]` with no trailing slash.
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require the http or https scheme
/// 3. Lowercase the host (done by the parser)
/// 4. Reject any path other than `/`, any query string and any fragment
///
/// # Examples
///
/// ```
/// use sumi_search::url::site_root;
///
/// let root = site_root("https://Example.COM/").unwrap();
/// assert_eq!(root, "https://example.com");
/// ```
pub fn site_root(url_str: &str) -> Result<String, UrlError> {
    let url = parse_http_url(url_str)?;

    if url.query().is_some() || url.fragment().is_some() {
        return Err(UrlError::Malformed(format!(
            "site URL must not carry a query or fragment: {}",
            url_str
        )));
    }

    if normalize_path(url.path()) != "/" {
        return Err(UrlError::Malformed(format!(
            "site URL must point at the site root: {}",
            url_str
        )));
    }

    origin_of(&url)
}

/// Splits a page URL into its site root and normalized path
///
/// The fragment is dropped; a query string makes the URL unusable because
/// pages are keyed by path alone.
///
/// # Examples
///
/// ```
/// use sumi_search::url::split_page_url;
///
/// let (root, path) = split_page_url("https://example.test/docs/a/").unwrap();
/// assert_eq!(root, "https://example.test");
/// assert_eq!(path, "/docs/a");
/// ```
pub fn split_page_url(url_str: &str) -> Result<(String, String), UrlError> {
    let url = parse_http_url(url_str)?;

    if url.query().is_some() {
        return Err(UrlError::Malformed(format!(
            "page URL must not carry a query: {}",
            url_str
        )));
    }

    Ok((origin_of(&url)?, normalize_path(url.path())))
}

/// Normalizes a URL path by removing dot segments and trailing slashes
///
/// Empty paths become `/`; the root keeps its slash.
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            // Skip empty segments (from multiple slashes) and current directory markers
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", normalized_segments.join("/"))
}

fn parse_http_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    Ok(url)
}

fn origin_of(url: &Url) -> Result<String, UrlError> {
    let host = url.host_str().ok_or(UrlError::MissingDomain)?;
    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}
