//! Statistics generation from the index database
//!
//! This module provides functionality for extracting and displaying
//! per-site indexing statistics from the storage layer.

use crate::state::SiteStatus;
use crate::storage::Storage;
use crate::SumiError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Totals across every site
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalStatistics {
    pub sites: u64,
    pub pages: u64,
    pub lemmas: u64,
    /// True while a crawl cycle is running
    pub indexing: bool,
}

/// Statistics of one site
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteStatistics {
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    pub status_time: DateTime<Utc>,
    pub error: Option<String>,
    pub pages: u64,
    pub lemmas: u64,
}

/// Index statistics summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub total: TotalStatistics,
    pub detailed: Vec<SiteStatistics>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `indexing` - Whether a crawl cycle is currently running
///
/// # Returns
///
/// * `Ok(StatisticsReport)` - Successfully loaded statistics
/// * `Err(SumiError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage, indexing: bool) -> Result<StatisticsReport, SumiError> {
    let total = TotalStatistics {
        sites: storage.count_sites()?,
        pages: storage.count_pages()?,
        lemmas: storage.count_lemmas()?,
        indexing,
    };

    let mut detailed = Vec::new();
    for site in storage.list_sites()? {
        detailed.push(SiteStatistics {
            pages: storage.count_pages_by_site(site.id)?,
            lemmas: storage.count_lemmas_by_site(site.id)?,
            url: site.url,
            name: site.name,
            status: site.status,
            status_time: site.status_time,
            error: site.last_error,
        });
    }

    Ok(StatisticsReport { total, detailed })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &StatisticsReport) {
    println!("=== Index Statistics ===\n");

    println!("Overview:");
    println!("  Sites: {}", stats.total.sites);
    println!("  Pages: {}", stats.total.pages);
    println!("  Lemmas: {}", stats.total.lemmas);
    println!(
        "  Indexing: {}",
        if stats.total.indexing { "running" } else { "idle" }
    );
    println!();

    if stats.detailed.is_empty() {
        println!("No sites indexed yet.");
        return;
    }

    println!("Sites:");
    for site in &stats.detailed {
        println!("  {} ({})", site.name, site.url);
        println!(
            "    Status: {} since {}",
            site.status,
            site.status_time.format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!("    Pages: {}, lemmas: {}", site.pages, site.lemmas);
        if let Some(error) = &site.error {
            println!("    Last error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;

    #[test]
    fn test_empty_statistics() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let stats = load_statistics(&storage, false).unwrap();

        assert_eq!(stats.total.sites, 0);
        assert_eq!(stats.total.pages, 0);
        assert!(!stats.total.indexing);
        assert!(stats.detailed.is_empty());
    }

    #[test]
    fn test_per_site_statistics() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let a = storage
            .save_site("https://a.test", "A", SiteStatus::Indexing)
            .unwrap();
        let b = storage
            .save_site("https://b.test", "B", SiteStatus::Indexing)
            .unwrap();
        storage.save_page(a, "/", 200, "").unwrap();
        storage.save_page(a, "/x", 200, "").unwrap();
        storage.upsert_lemma_increment_frequency(a, "fox").unwrap();
        storage
            .update_site_status(b, SiteStatus::Failed, Some("boom"))
            .unwrap();

        let stats = load_statistics(&storage, true).unwrap();

        assert_eq!(stats.total.sites, 2);
        assert_eq!(stats.total.pages, 2);
        assert_eq!(stats.total.lemmas, 1);
        assert!(stats.total.indexing);

        assert_eq!(stats.detailed[0].url, "https://a.test");
        assert_eq!(stats.detailed[0].pages, 2);
        assert_eq!(stats.detailed[0].lemmas, 1);
        assert_eq!(stats.detailed[1].status, SiteStatus::Failed);
        assert_eq!(stats.detailed[1].error.as_deref(), Some("boom"));
    }
}
