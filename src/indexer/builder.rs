//! Incremental per-page index updates
//!
//! Re-indexing a page replaces its index rows and adjusts per-site lemma
//! frequencies by the difference between the old and new lemma sets, all
//! inside one transaction.

use crate::indexer::lemmas::LemmaCounts;
use crate::storage::{Storage, StorageResult};
use std::collections::HashMap;

/// What a page re-index changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexOutcome {
    /// Lemmas the page did not contain before
    pub added: usize,
    /// Lemmas the page no longer contains
    pub removed: usize,
    /// Lemmas present before and after
    pub retained: usize,
}

/// Replaces the index of one page with `counts`
///
/// Passing empty counts clears the page from the index. On error the
/// transaction is rolled back and nothing is changed.
pub fn index_page(
    storage: &mut dyn Storage,
    site_id: i64,
    page_id: i64,
    counts: &LemmaCounts,
) -> StorageResult<IndexOutcome> {
    storage.begin_transaction()?;

    match apply(storage, site_id, page_id, counts) {
        Ok(outcome) => {
            storage.commit_transaction()?;
            Ok(outcome)
        }
        Err(e) => {
            if let Err(rollback_err) = storage.rollback_transaction() {
                tracing::warn!("Rollback failed for page {}: {}", page_id, rollback_err);
            }
            Err(e)
        }
    }
}

fn apply(
    storage: &mut dyn Storage,
    site_id: i64,
    page_id: i64,
    counts: &LemmaCounts,
) -> StorageResult<IndexOutcome> {
    let previous: HashMap<String, i64> = storage
        .find_page_lemmas(page_id)?
        .into_iter()
        .map(|row| (row.lemma, row.lemma_id))
        .collect();

    storage.delete_indexes_by_page(page_id)?;

    let mut outcome = IndexOutcome::default();

    for lemma in previous.keys() {
        if !counts.contains_key(lemma) {
            storage.decrement_or_delete_lemma(site_id, lemma)?;
            outcome.removed += 1;
        }
    }

    let total: u32 = counts.values().sum();
    for (lemma, count) in counts {
        let lemma_id = match previous.get(lemma) {
            Some(&id) => {
                outcome.retained += 1;
                id
            }
            None => {
                outcome.added += 1;
                storage.upsert_lemma_increment_frequency(site_id, lemma)?
            }
        };

        let rank = f64::from(*count) / f64::from(total);
        storage.upsert_index(page_id, lemma_id, rank)?;
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SiteStatus;
    use crate::storage::SqliteStorage;

    fn counts(pairs: &[(&str, u32)]) -> LemmaCounts {
        pairs.iter().map(|(l, c)| (l.to_string(), *c)).collect()
    }

    fn setup() -> (SqliteStorage, i64, i64) {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let site_id = storage
            .save_site("https://example.test", "Example", SiteStatus::Indexing)
            .unwrap();
        let page_id = storage.save_page(site_id, "/", 200, "").unwrap();
        (storage, site_id, page_id)
    }

    #[test]
    fn test_ranks_are_normalized() {
        let (mut storage, site_id, page_id) = setup();
        index_page(&mut storage, site_id, page_id, &counts(&[("quick", 1), ("fox", 3)])).unwrap();

        let rows = storage.find_page_lemmas(page_id).unwrap();
        let fox = rows.iter().find(|r| r.lemma == "fox").unwrap();
        let quick = rows.iter().find(|r| r.lemma == "quick").unwrap();
        assert_eq!(fox.rank, 0.75);
        assert_eq!(quick.rank, 0.25);
    }

    #[test]
    fn test_reindex_is_idempotent() {
        let (mut storage, site_id, page_id) = setup();
        let lemmas = counts(&[("quick", 1), ("fox", 1)]);

        let first = index_page(&mut storage, site_id, page_id, &lemmas).unwrap();
        let second = index_page(&mut storage, site_id, page_id, &lemmas).unwrap();

        assert_eq!(first.added, 2);
        assert_eq!(second, IndexOutcome { added: 0, removed: 0, retained: 2 });
        assert_eq!(storage.find_lemmas(Some(site_id), "fox").unwrap()[0].frequency, 1);
        assert_eq!(storage.find_page_lemmas(page_id).unwrap().len(), 2);
    }

    #[test]
    fn test_frequency_counts_distinct_pages() {
        let (mut storage, site_id, page_a) = setup();
        let page_b = storage.save_page(site_id, "/b", 200, "").unwrap();

        index_page(&mut storage, site_id, page_a, &counts(&[("fox", 5)])).unwrap();
        index_page(&mut storage, site_id, page_b, &counts(&[("fox", 1)])).unwrap();

        assert_eq!(storage.find_lemmas(Some(site_id), "fox").unwrap()[0].frequency, 2);
    }

    #[test]
    fn test_removed_lemma_is_deleted() {
        let (mut storage, site_id, page_id) = setup();
        index_page(&mut storage, site_id, page_id, &counts(&[("quick", 1), ("fox", 1)])).unwrap();

        let outcome = index_page(&mut storage, site_id, page_id, &counts(&[("fox", 2)])).unwrap();

        assert_eq!(outcome.removed, 1);
        assert!(storage.find_lemmas(Some(site_id), "quick").unwrap().is_empty());
        let rows = storage.find_page_lemmas(page_id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rank, 1.0);
    }

    #[test]
    fn test_removed_lemma_shared_with_other_page_survives() {
        let (mut storage, site_id, page_a) = setup();
        let page_b = storage.save_page(site_id, "/b", 200, "").unwrap();
        index_page(&mut storage, site_id, page_a, &counts(&[("fox", 1)])).unwrap();
        index_page(&mut storage, site_id, page_b, &counts(&[("fox", 1)])).unwrap();

        index_page(&mut storage, site_id, page_a, &LemmaCounts::new()).unwrap();

        assert_eq!(storage.find_lemmas(Some(site_id), "fox").unwrap()[0].frequency, 1);
        assert!(storage.find_page_lemmas(page_a).unwrap().is_empty());
    }

    #[test]
    fn test_ranks_sum_to_one() {
        let (mut storage, site_id, page_id) = setup();
        index_page(
            &mut storage,
            site_id,
            page_id,
            &counts(&[("a", 3), ("b", 5), ("c", 7)]),
        )
        .unwrap();

        let sum: f64 = storage
            .find_page_lemmas(page_id)
            .unwrap()
            .iter()
            .map(|r| r.rank)
            .sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_failed_update_rolls_back() {
        let (mut storage, site_id, _) = setup();
        // Page 9999 does not exist, so the index row violates its foreign key
        let result = index_page(&mut storage, site_id, 9999, &counts(&[("fox", 1)]));

        assert!(result.is_err());
        assert!(storage.find_lemmas(Some(site_id), "fox").unwrap().is_empty());
    }
}
