//! Crawler coordinator - crawl orchestration logic
//!
//! This module drives a crawl cycle over every configured site:
//! - Marking sites INDEXING and optionally purging their old pages
//! - Spawning one task per discovered page, bounded by a semaphore
//! - Fetching, storing, link-expanding and indexing each page
//! - Resolving each site to INDEXED or FAILED exactly once
//! - Stopping a running cycle

use crate::config::{CrawlerConfig, SiteEntry};
use crate::crawler::fetcher::{fetch_page, FetchedPage};
use crate::crawler::parser::page_links;
use crate::crawler::scheduler::CrawlRun;
use crate::indexer::Indexer;
use crate::state::SiteStatus;
use crate::storage::{lock_storage, SharedStorage, Storage};
use crate::url::{candidate_path, is_within_subtree, site_root};
use crate::SumiError;
use reqwest::Client;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Error recorded on sites that were still indexing when a crawl was stopped
pub const INTERRUPTED_MESSAGE: &str = "Indexing interrupted";

/// One page to crawl
#[derive(Debug, Clone)]
pub struct PageTask {
    pub site_id: i64,
    /// Root URL of the site (scheme://host[:port])
    pub site_url: String,
    /// Normalized path below the site root
    pub path: String,
}

impl PageTask {
    pub fn url(&self) -> String {
        format!("{}{}", self.site_url, self.path)
    }
}

/// How a page task ended
#[derive(Debug)]
enum PageOutcome {
    Completed,
    Cancelled,
    Failed(String),
}

/// Main crawler coordinator structure
pub struct Coordinator {
    storage: SharedStorage,
    indexer: Indexer,
    client: Client,
    politeness_delay: Duration,
    max_concurrent_pages: usize,
    current: Mutex<Option<Arc<CrawlRun>>>,
}

impl Coordinator {
    /// Creates a new coordinator
    ///
    /// # Arguments
    ///
    /// * `storage` - Shared storage for sites, pages and the index
    /// * `indexer` - Indexer writing page lemmas
    /// * `client` - HTTP client used for every fetch
    /// * `config` - Crawler limits and delays
    pub fn new(
        storage: SharedStorage,
        indexer: Indexer,
        client: Client,
        config: &CrawlerConfig,
    ) -> Self {
        Self {
            storage,
            indexer,
            client,
            politeness_delay: Duration::from_millis(config.politeness_delay),
            max_concurrent_pages: config.max_concurrent_pages as usize,
            current: Mutex::new(None),
        }
    }

    fn current_run(&self) -> Option<Arc<CrawlRun>> {
        self.current.lock().ok().and_then(|current| current.clone())
    }

    /// True while any task of the current cycle is still alive
    ///
    /// A stopped cycle keeps counting as running until its in-flight tasks
    /// have wound down.
    pub fn is_running(&self) -> bool {
        self.current_run().is_some_and(|run| run.active_count() > 0)
    }

    /// Starts a crawl cycle over `sites`
    ///
    /// Must be called from within a Tokio runtime. Returns false if a cycle
    /// is already running, a stopped cycle still has tasks alive, or no site
    /// could be prepared.
    pub fn start_crawl(self: &Arc<Self>, sites: &[SiteEntry], fresh: bool) -> bool {
        // Held for the whole check-and-start so two callers cannot both start
        let mut current = match self.current.lock() {
            Ok(current) => current,
            Err(_) => {
                tracing::error!("Crawl state lock poisoned");
                return false;
            }
        };

        if let Some(run) = current.as_ref() {
            if run.active_count() > 0 {
                if run.is_cancelled() {
                    tracing::info!("Previous indexing is still winding down");
                } else {
                    tracing::info!("Indexing already running");
                }
                return false;
            }
        }

        let run = Arc::new(CrawlRun::new(self.max_concurrent_pages));
        let mut roots = Vec::new();

        for site in sites {
            match self.prepare_site(site, fresh) {
                Ok(task) => {
                    run.register_site(task.site_id);
                    roots.push(task);
                }
                Err(e) => tracing::error!("Failed to prepare site {}: {}", site.url, e),
            }
        }

        if roots.is_empty() {
            tracing::warn!("No sites to index");
            return false;
        }

        // Keeps the run live until every root is submitted
        let _starting = run.begin_task();
        *current = Some(run.clone());
        drop(current);

        tracing::info!("Starting indexing of {} sites", roots.len());
        for task in roots {
            self.submit(&run, task);
        }
        true
    }

    /// Marks a site INDEXING and returns the task for its root page
    fn prepare_site(&self, site: &SiteEntry, fresh: bool) -> Result<PageTask, SumiError> {
        let root = site_root(&site.url)?;

        let site_id = {
            let mut storage = lock_storage(&self.storage)?;
            storage.save_site(&root, &site.name, SiteStatus::Indexing)?
        };
        tracing::info!("Site {} is {}", root, SiteStatus::Indexing);

        if fresh {
            let purged = self.indexer.purge_site(site_id)?;
            tracing::info!("Purged {} pages of {}", purged, root);
        }

        Ok(PageTask {
            site_id,
            site_url: root,
            path: "/".to_string(),
        })
    }

    /// Stops the running crawl cycle without waiting for its tasks
    ///
    /// Every site still indexing is recorded as FAILED with
    /// [`INTERRUPTED_MESSAGE`]; sites that already finished keep their status.
    /// The run's visited set and site progress are dropped. Returns false if
    /// nothing was running or the cycle was already stopped.
    pub fn stop(&self) -> bool {
        let Some(run) = self.current_run() else {
            return false;
        };
        if run.is_cancelled() || run.active_count() == 0 {
            return false;
        }

        // Sites are resolved before the cancel flag flips so a finishing task
        // can no longer mark them INDEXED
        let interrupted = run.interrupt_all();
        for site_id in &interrupted {
            self.persist_status(*site_id, SiteStatus::Failed, Some(INTERRUPTED_MESSAGE));
        }
        run.cancel();
        run.discard_state();

        tracing::info!("Indexing stopped, {} sites interrupted", interrupted.len());
        true
    }

    /// Waits until every task of the current cycle has exited
    pub async fn wait_until_idle(&self) {
        if let Some(run) = self.current_run() {
            run.wait_until_idle().await;
        }
    }

    /// Spawns a task for a page unless the run is cancelled or the page was
    /// already submitted
    fn submit(self: &Arc<Self>, run: &Arc<CrawlRun>, task: PageTask) -> bool {
        if run.is_cancelled() || !run.try_visit(task.site_id, &task.path) {
            return false;
        }

        run.task_started(task.site_id);
        let guard = run.begin_task();
        let this = self.clone();
        let run = run.clone();

        tokio::spawn(async move {
            let _guard = guard;
            this.run_task(&run, task).await;
        });
        true
    }

    async fn run_task(self: &Arc<Self>, run: &Arc<CrawlRun>, task: PageTask) {
        let outcome = tokio::select! {
            biased;
            _ = run.cancelled() => PageOutcome::Cancelled,
            outcome = self.crawl_page(run, &task) => outcome,
        };

        match outcome {
            PageOutcome::Completed => {}
            PageOutcome::Cancelled => tracing::trace!("Task for {} cancelled", task.url()),
            PageOutcome::Failed(message) => self.fail_site(run, task.site_id, &message),
        }

        self.finish_task(run, task.site_id);
    }

    async fn crawl_page(self: &Arc<Self>, run: &Arc<CrawlRun>, task: &PageTask) -> PageOutcome {
        let Some(_permit) = run.acquire_permit().await else {
            return PageOutcome::Cancelled;
        };

        if !self.politeness_delay.is_zero() {
            tokio::time::sleep(self.politeness_delay).await;
        }

        let url = task.url();
        tracing::debug!("Fetching {}", url);

        let page = match fetch_page(&self.client, &url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                return PageOutcome::Failed(format!("{}: {}", url, e));
            }
        };

        match self.store_page(run, task, &page) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Failed to store {}: {}", url, e);
                PageOutcome::Failed(format!("{}: {}", url, e))
            }
        }
    }

    /// Saves a fetched page, follows its links and indexes it
    fn store_page(
        self: &Arc<Self>,
        run: &Arc<CrawlRun>,
        task: &PageTask,
        page: &FetchedPage,
    ) -> Result<PageOutcome, SumiError> {
        if run.is_cancelled() {
            return Ok(PageOutcome::Cancelled);
        }

        let page_id = {
            let mut storage = lock_storage(&self.storage)?;
            storage.save_page(task.site_id, &task.path, page.status_code, &page.body)?
        };

        if !page.is_indexable() {
            tracing::debug!(
                "{} answered {} ({}), not indexing",
                task.url(),
                page.status_code,
                page.content_type.as_deref().unwrap_or("no content type")
            );
            self.indexer.clear_page(task.site_id, page_id)?;
            return Ok(PageOutcome::Completed);
        }

        let submitted = self.submit_links(run, task, page);
        tracing::debug!("{}: {} new links", task.url(), submitted);

        if run.is_cancelled() {
            return Ok(PageOutcome::Cancelled);
        }
        self.indexer.index_html(task.site_id, page_id, &page.body)?;

        Ok(PageOutcome::Completed)
    }

    /// Submits every same-site link below the page's path
    fn submit_links(self: &Arc<Self>, run: &Arc<CrawlRun>, task: &PageTask, page: &FetchedPage) -> usize {
        let (Ok(base), Ok(site)) = (Url::parse(&page.final_url), Url::parse(&task.site_url)) else {
            return 0;
        };
        if base.origin() != site.origin() {
            tracing::debug!("{} redirected off-site to {}", task.url(), page.final_url);
            return 0;
        }

        let mut submitted = 0;
        for href in page_links(&page.body) {
            let Some(path) = candidate_path(&href, &base) else {
                continue;
            };
            if !is_within_subtree(&task.path, &path) {
                continue;
            }

            let child = PageTask {
                site_id: task.site_id,
                site_url: task.site_url.clone(),
                path,
            };
            if self.submit(run, child) {
                submitted += 1;
            }
        }
        submitted
    }

    fn fail_site(&self, run: &CrawlRun, site_id: i64, message: &str) {
        if run.mark_site_failed(site_id) {
            tracing::warn!("Site {} is {}: {}", site_id, SiteStatus::Failed, message);
            self.persist_status(site_id, SiteStatus::Failed, Some(message));
        }
    }

    fn finish_task(&self, run: &CrawlRun, site_id: i64) {
        if let Some(status) = run.task_finished(site_id) {
            tracing::info!("Site {} is {}", site_id, status);
            self.persist_status(site_id, status, None);
        }
    }

    fn persist_status(&self, site_id: i64, status: SiteStatus, error: Option<&str>) {
        let result = lock_storage(&self.storage)
            .and_then(|mut storage| storage.update_site_status(site_id, status, error));
        if let Err(e) = result {
            tracing::error!("Failed to record status {} for site {}: {}", status, site_id, e);
        }
    }
}
