//! Service facade
//!
//! [`SearchEngine`] wires storage, the crawler, the indexer and the query
//! planner together and exposes the operations an outer layer (CLI or HTTP
//! handlers) calls.

use crate::config::{Config, SiteEntry};
use crate::crawler::{build_http_client, fetch_page, Coordinator};
use crate::indexer::{IndexGeneration, Indexer, LemmaExtractor};
use crate::morphology::{default_morphology, Morphology};
use crate::output::{load_statistics, StatisticsReport};
use crate::search::{QueryPlanner, SearchResults};
use crate::state::SiteStatus;
use crate::storage::{lock_storage, open_storage, SharedStorage, SqliteStorage, Storage};
use crate::url::{site_root, split_page_url};
use crate::SumiError;
use reqwest::Client;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// The search engine service
pub struct SearchEngine {
    config: Config,
    storage: SharedStorage,
    client: Client,
    indexer: Indexer,
    coordinator: Arc<Coordinator>,
    planner: QueryPlanner,
}

impl SearchEngine {
    /// Opens the configured database and builds the engine
    ///
    /// # Returns
    ///
    /// * `Ok(SearchEngine)` - Ready to index and search
    /// * `Err(SumiError)` - The database or HTTP client could not be set up
    pub fn new(config: Config) -> Result<Self, SumiError> {
        let storage = open_storage(Path::new(&config.storage.database_path))?;
        Self::with_storage(config, storage, default_morphology())
    }

    /// Builds the engine on an already opened storage and analyzer
    pub fn with_storage(
        config: Config,
        storage: SqliteStorage,
        morphology: Arc<dyn Morphology>,
    ) -> Result<Self, SumiError> {
        let storage: SharedStorage = Arc::new(Mutex::new(storage));
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout)?;
        let extractor = Arc::new(LemmaExtractor::new(morphology));
        let generation = Arc::new(IndexGeneration::new());

        let indexer = Indexer::new(storage.clone(), extractor.clone(), generation.clone());
        let coordinator = Arc::new(Coordinator::new(
            storage.clone(),
            indexer.clone(),
            client.clone(),
            &config.crawler,
        ));
        let planner = QueryPlanner::new(
            storage.clone(),
            extractor,
            generation,
            config.search.clone(),
        );

        Ok(Self {
            config,
            storage,
            client,
            indexer,
            coordinator,
            planner,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Starts crawling every configured site in the background
    ///
    /// Returns false if indexing is already running.
    pub fn start_indexing(&self) -> bool {
        self.coordinator
            .start_crawl(&self.config.sites, self.config.crawler.fresh_start)
    }

    /// Stops a running crawl without waiting for it
    ///
    /// Returns false if indexing was not running.
    pub fn stop_indexing(&self) -> bool {
        self.coordinator.stop()
    }

    pub fn is_indexing(&self) -> bool {
        self.coordinator.is_running()
    }

    /// Waits until the current crawl's tasks have all exited
    pub async fn wait_for_indexing(&self) {
        self.coordinator.wait_until_idle().await;
    }

    /// Fetches and re-indexes a single page of a configured site
    ///
    /// The URL must belong to one of the configured sites. Foreign or
    /// malformed URLs are rejected without touching storage. While a crawl
    /// is running the site's status is left to the crawl.
    pub async fn index_page(&self, url: &str) -> bool {
        let (root, path) = match split_page_url(url) {
            Ok(parts) => parts,
            Err(e) => {
                tracing::warn!("Rejected page URL {}: {}", url, e);
                return false;
            }
        };

        let Some(site) = self.configured_site(&root) else {
            tracing::warn!("{} does not belong to a configured site", url);
            return false;
        };

        match self.reindex_page(site, &root, &path).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to index {}: {}", url, e);
                false
            }
        }
    }

    fn configured_site(&self, root: &str) -> Option<&SiteEntry> {
        self.config
            .sites
            .iter()
            .find(|site| site_root(&site.url).is_ok_and(|r| r == root))
    }

    async fn reindex_page(&self, site: &SiteEntry, root: &str, path: &str) -> Result<(), SumiError> {
        let crawling = self.coordinator.is_running();

        let (site_id, track_status) = {
            let mut storage = lock_storage(&self.storage)?;
            match storage.find_site_by_url(root)? {
                Some(existing) => {
                    if !crawling {
                        storage.update_site_status(existing.id, SiteStatus::Indexing, None)?;
                    }
                    (existing.id, !crawling)
                }
                None => (
                    storage.save_site(root, &site.name, SiteStatus::Indexing)?,
                    true,
                ),
            }
        };

        let url = format!("{}{}", root, path);
        let result = self.fetch_and_index(site_id, path, &url).await;

        // A crawl started during the fetch owns the site's status from now on
        if track_status && self.coordinator.is_running() {
            tracing::debug!("Indexing started while fetching {}, leaving site status", url);
        } else if track_status {
            let (status, error) = match &result {
                Ok(()) => (SiteStatus::Indexed, None),
                Err(e) => (SiteStatus::Failed, Some(format!("{}: {}", url, e))),
            };
            lock_storage(&self.storage)?.update_site_status(site_id, status, error.as_deref())?;
            tracing::info!("Site {} is {}", root, status);
        }

        result
    }

    async fn fetch_and_index(&self, site_id: i64, path: &str, url: &str) -> Result<(), SumiError> {
        tracing::debug!("Fetching {}", url);
        let page = fetch_page(&self.client, url).await?;

        let page_id = lock_storage(&self.storage)?.save_page(
            site_id,
            path,
            page.status_code,
            &page.body,
        )?;

        if page.is_indexable() {
            self.indexer.index_html(site_id, page_id, &page.body)?;
        } else {
            tracing::debug!("{} answered {}, clearing its index", url, page.status_code);
            self.indexer.clear_page(site_id, page_id)?;
        }
        Ok(())
    }

    /// Collects totals and per-site statistics
    pub fn statistics(&self) -> Result<StatisticsReport, SumiError> {
        let indexing = self.is_indexing();
        let storage = lock_storage(&self.storage)?;
        load_statistics(&*storage, indexing)
    }

    /// Runs a search query
    ///
    /// # Arguments
    ///
    /// * `query` - Raw query text
    /// * `site` - Root URL of a site to restrict results to
    /// * `offset` - Number of ranked results to skip
    /// * `limit` - Maximum number of results; 0 selects the configured default
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResults)` - The requested page of results
    /// * `Err(SumiError::EmptyQuery)` - The query has no content words
    /// * `Err(SumiError::UnknownSite)` - `site` is not an indexed site
    pub fn search(
        &self,
        query: &str,
        site: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<SearchResults, SumiError> {
        let site_id = match site {
            Some(site_url) => Some(self.resolve_site(site_url)?),
            None => None,
        };
        self.planner.search(query, site_id, offset, limit)
    }

    fn resolve_site(&self, site_url: &str) -> Result<i64, SumiError> {
        let unknown = || SumiError::UnknownSite(site_url.to_string());
        let root = site_root(site_url).map_err(|_| unknown())?;
        let site = lock_storage(&self.storage)?.find_site_by_url(&root)?;
        site.map(|s| s.id).ok_or_else(unknown)
    }
}
