//! Console rendering of search results

use crate::search::SearchResults;

/// Prints a page of search results to stdout
///
/// # Arguments
///
/// * `query` - The query as typed
/// * `offset` - Offset the page starts at
/// * `results` - The results to display
pub fn print_search_results(query: &str, offset: usize, results: &SearchResults) {
    println!("=== Results for \"{}\" ===\n", query);

    if results.results.is_empty() {
        println!("No results ({} total).", results.count);
        return;
    }

    for (i, result) in results.results.iter().enumerate() {
        let title = if result.title.is_empty() {
            result.uri.as_str()
        } else {
            result.title.as_str()
        };
        println!("{}. {} [{:.4}]", offset + i + 1, title, result.relevance);
        println!("   {}{} ({})", result.site, result.uri, result.site_name);
        println!("   {}", result.snippet);
        println!();
    }

    println!(
        "Showing {}-{} of {}",
        offset + 1,
        offset + results.results.len(),
        results.count
    );
}
