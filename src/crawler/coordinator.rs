//! Crawler coordinator - breadth-first crawl orchestration
//!
//! This module contains the layered crawl loop:
//! - Parsing the start URL and fixing the origin host
//! - Snapshotting the frontier into one BFS layer per depth level
//! - Dispatching the layer onto the bounded worker pool
//! - Waiting on the layer barrier before the next depth starts
//! - Draining the pool with a grace period when the loop ends
//!
//! Within a layer pages complete in any order; results are appended in
//! completion order. Every page of depth d is finished before any page of
//! depth d + 1 is dispatched.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{HttpFetcher, PageFetcher};
use crate::crawler::parser::{extract_page, ExtractionContext};
use crate::crawler::scheduler::{Frontier, PolitenessDelay, WorkerPool};
use crate::results::PageResult;
use crate::state::{AssetLedger, VisitedPages};
use crate::url::parse_start_url;
use crate::ImageFinderError;
use std::sync::Arc;
use url::Url;

/// Breadth-first asset crawler
///
/// A `Crawler` holds configuration and the page fetcher; every call to
/// [`Crawler::crawl`] starts a run with fresh visited and asset sets.
pub struct Crawler {
    config: CrawlerConfig,
    fetcher: Arc<dyn PageFetcher>,
    delay: PolitenessDelay,
}

/// State shared by the page tasks of one run
struct CrawlRun {
    start_url: Url,
    origin_host: String,
    visited: VisitedPages,
    ledger: AssetLedger,
    frontier: Frontier,
    fetcher: Arc<dyn PageFetcher>,
    delay: PolitenessDelay,
}

impl Crawler {
    /// Creates a crawler over an injected page fetcher
    pub fn new(config: CrawlerConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        let delay = PolitenessDelay::from_config(&config);
        Self {
            config,
            fetcher,
            delay,
        }
    }

    /// Creates a crawler fetching over HTTP
    pub fn from_config(config: CrawlerConfig) -> Result<Self, ImageFinderError> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::new(config, Arc::new(fetcher)))
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Crawls from `start_url` until depth, frontier or asset budget runs out
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<PageResult>)` - Pages that yielded at least one asset
    /// * `Err(ImageFinderError::InvalidUrl)` - The start URL cannot be crawled
    ///
    /// The number of collected assets may exceed `max_assets` by up to the
    /// worker pool size, see [`AssetLedger`].
    pub async fn crawl(
        &self,
        start_url: &str,
        max_assets: usize,
    ) -> Result<Vec<PageResult>, ImageFinderError> {
        let (start_url, origin_host) = parse_start_url(start_url)?;
        tracing::info!(
            "Starting crawl of {} (origin host {}, budget {})",
            start_url,
            origin_host,
            max_assets
        );

        let run = Arc::new(CrawlRun {
            frontier: Frontier::new(start_url.clone()),
            start_url,
            origin_host,
            visited: VisitedPages::new(),
            ledger: AssetLedger::new(max_assets),
            fetcher: Arc::clone(&self.fetcher),
            delay: self.delay,
        });

        let mut pool = WorkerPool::new(self.config.workers as usize);
        let mut results = Vec::new();

        for depth in 0..=self.config.max_depth {
            if run.ledger.is_exhausted() {
                tracing::info!("Asset budget reached before depth {}", depth);
                break;
            }

            if run.frontier.is_empty() {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            }

            // URLs pushed while this layer runs belong to the next depth
            let layer_size = run.frontier.len();

            tracing::info!("Crawling depth {} with {} URL(s)", depth, layer_size);

            for _ in 0..layer_size {
                let Some(url) = run.frontier.pop() else {
                    break;
                };
                let run = Arc::clone(&run);
                pool.spawn(async move { run.process_page(url).await });
            }

            let layer_results: Vec<PageResult> =
                pool.barrier().await.into_iter().flatten().collect();
            tracing::debug!(
                "Depth {} done: {} page(s) with assets, {} asset(s) collected so far",
                depth,
                layer_results.len(),
                run.ledger.collected()
            );
            results.extend(layer_results);
        }

        results.extend(
            pool.drain(self.config.drain_grace())
                .await
                .into_iter()
                .flatten(),
        );

        tracing::info!(
            "Crawl completed: {} page(s) visited, {} with assets, {} asset(s) collected",
            run.visited.len(),
            results.len(),
            run.ledger.collected()
        );

        Ok(results)
    }
}

impl CrawlRun {
    /// Processes a single URL
    ///
    /// This method:
    /// 1. Skips the URL if the budget is spent or another task claimed it
    /// 2. Waits out the politeness delay
    /// 3. Fetches the page; failures are logged and the page is skipped
    /// 4. Extracts assets and enqueues same-origin links
    async fn process_page(&self, url: Url) -> Option<PageResult> {
        if self.ledger.is_exhausted() {
            tracing::trace!("Budget spent, skipping {}", url);
            return None;
        }

        if !self.visited.claim(url.as_str()) {
            tracing::trace!("Already visited {}", url);
            return None;
        }

        tracing::debug!("Visiting {}", url);
        self.delay.wait().await;

        let page = match self.fetcher.fetch(&url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Error retrieving {}: {}", url, e);
                return None;
            }
        };

        let ctx = ExtractionContext {
            origin_host: &self.origin_host,
            ledger: &self.ledger,
            is_start_page: url == self.start_url,
        };
        let extraction = extract_page(&page.body, &page.url, &ctx);

        if extraction.budget_exhausted {
            tracing::debug!("Asset budget reached while extracting {}", url);
        }

        tracing::debug!(
            "{}: {} asset(s), {} link(s)",
            url,
            extraction.assets.len(),
            extraction.links.len()
        );
        self.frontier.extend(extraction.links);

        PageResult::from_assets(url.as_str(), extraction.assets)
    }
}

/// Crawls over HTTP with the default crawler configuration
///
/// # Example
///
/// ```no_run
/// use image_finder::crawler::crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pages = crawl("https://example.com/", 10).await?;
/// for page in &pages {
///     println!("{}: {} asset(s)", page.source_url, page.children.len());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn crawl(start_url: &str, max_assets: usize) -> Result<Vec<PageResult>, ImageFinderError> {
    Crawler::from_config(CrawlerConfig::default())?
        .crawl(start_url, max_assets)
        .await
}
