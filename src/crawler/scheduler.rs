//! Shared state of one crawl cycle
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - The visited set of (site, path) pairs
//! - Per-site outstanding task counts and status resolution
//! - Cancellation and quiescence signalling

use crate::state::{SiteProgress, SiteStatus};
use dashmap::{DashMap, DashSet};
use std::sync::Arc;
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};

/// State shared by every task of a crawl cycle
///
/// A new `CrawlRun` is created for each `start_crawl`, so a stopped run can
/// never leak tasks or visited entries into the next one.
pub struct CrawlRun {
    /// Global semaphore for limiting concurrent fetches
    semaphore: Arc<Semaphore>,

    /// Every (site, path) ever submitted in this run
    visited: DashSet<(i64, String)>,

    /// Per-site progress, keyed by site ID
    sites: DashMap<i64, SiteProgress>,

    /// Number of spawned tasks that have not exited yet
    active: watch::Sender<usize>,

    /// Flipped once by `cancel`
    cancel: watch::Sender<bool>,
}

/// Keeps the active task count raised while a task is alive
pub struct ActiveTask {
    run: Arc<CrawlRun>,
}

impl Drop for ActiveTask {
    fn drop(&mut self) {
        self.run.active.send_modify(|n| *n = n.saturating_sub(1));
    }
}

impl CrawlRun {
    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `max_concurrent_pages` - Upper bound on simultaneously running page tasks
    pub fn new(max_concurrent_pages: usize) -> Self {
        let (active, _) = watch::channel(0);
        let (cancel, _) = watch::channel(false);

        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent_pages.max(1))),
            visited: DashSet::new(),
            sites: DashMap::new(),
            active,
            cancel,
        }
    }

    /// Marks a path as visited, returning false if it already was
    pub fn try_visit(&self, site_id: i64, path: &str) -> bool {
        self.visited.insert((site_id, path.to_string()))
    }

    #[cfg(test)]
    pub(crate) fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Registers a site taking part in this run
    pub fn register_site(&self, site_id: i64) {
        self.sites.insert(site_id, SiteProgress::new());
    }

    #[cfg(test)]
    pub(crate) fn site_status(&self, site_id: i64) -> Option<SiteStatus> {
        self.sites.get(&site_id).map(|progress| progress.status())
    }

    /// Records a new outstanding task for a site
    pub fn task_started(&self, site_id: i64) {
        if let Some(mut progress) = self.sites.get_mut(&site_id) {
            progress.task_started();
        }
    }

    /// Records a finished task, returning the status the site resolved to
    ///
    /// The decrement and the transition happen under the same entry lock, so
    /// exactly one task observes the site completing.
    pub fn task_finished(&self, site_id: i64) -> Option<SiteStatus> {
        self.sites
            .get_mut(&site_id)
            .and_then(|mut progress| progress.task_finished())
    }

    /// Marks a site failed, returning true if this call resolved it
    pub fn mark_site_failed(&self, site_id: i64) -> bool {
        self.sites
            .get_mut(&site_id)
            .is_some_and(|mut progress| progress.mark_failed())
    }

    /// Resolves every unresolved site to FAILED
    ///
    /// # Returns
    ///
    /// The IDs of the sites this call resolved
    pub fn interrupt_all(&self) -> Vec<i64> {
        self.sites
            .iter_mut()
            .filter_map(|mut entry| entry.interrupt().then_some(*entry.key()))
            .collect()
    }

    /// Registers a spawned task until the returned guard is dropped
    pub fn begin_task(self: &Arc<Self>) -> ActiveTask {
        self.active.send_modify(|n| *n += 1);
        ActiveTask { run: self.clone() }
    }

    /// Number of tasks still alive
    pub fn active_count(&self) -> usize {
        *self.active.borrow()
    }

    /// Waits until no task of this run is alive
    pub async fn wait_until_idle(&self) {
        let mut rx = self.active.subscribe();
        // The sender lives in self, so the channel cannot close here
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Signals every task of this run to stop
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Resolves once the run is cancelled
    pub async fn cancelled(&self) {
        let mut rx = self.cancel.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Drops the visited set and per-site progress of a stopped run
    ///
    /// Tasks still winding down find no progress entry and resolve nothing.
    pub fn discard_state(&self) {
        self.visited.clear();
        self.sites.clear();
    }

    /// Acquires a slot from the global concurrency limit
    pub async fn acquire_permit(&self) -> Option<OwnedSemaphorePermit> {
        self.semaphore.clone().acquire_owned().await.ok()
    }
}
