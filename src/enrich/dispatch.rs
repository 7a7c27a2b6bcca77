//! Per-page enrichment dispatch
//!
//! Children that may run concurrently are cloned into tasks on a pool that
//! draws permits from one semaphore shared by every call, so the total
//! number of in-flight enrichments stays bounded across pages. The other
//! children are enriched in place on the calling task, in order. Once they
//! are done the concurrent tasks get a fixed ceiling to finish; whatever is
//! still running is cancelled and keeps its fields unset.

use super::AiBackends;
use crate::config::EnrichmentConfig;
use crate::crawler::WorkerPool;
use crate::results::PageResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Runs AI enrichment over crawl results
pub struct Enricher {
    backends: AiBackends,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl Enricher {
    pub fn new(backends: AiBackends, config: &EnrichmentConfig) -> Self {
        Self::with_limits(backends, config.max_concurrent as usize, config.timeout())
    }

    pub fn with_limits(backends: AiBackends, max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            backends,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout,
        }
    }

    pub fn backends(&self) -> &AiBackends {
        &self.backends
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Enriches a page's children in place
    ///
    /// Never fails. Children whose enrichment fails or times out are left
    /// as they were.
    pub async fn enrich(&self, page: &mut PageResult) {
        let mut pool = WorkerPool::with_permits(Arc::clone(&self.permits));
        let mut sequential = Vec::new();

        for (index, child) in page.children.iter().enumerate() {
            if child.runs_concurrently() {
                let mut asset = child.clone();
                let backends = self.backends.clone();
                pool.spawn(async move {
                    asset.enrich(&backends).await;
                    (index, asset)
                });
            } else {
                sequential.push(index);
            }
        }

        tracing::debug!(
            "Enriching {}: {} concurrent, {} sequential",
            page.source_url,
            pool.in_flight(),
            sequential.len()
        );

        for index in sequential {
            page.children[index].enrich(&self.backends).await;
        }

        let spawned = pool.in_flight();
        let finished = pool.drain(self.timeout).await;
        if finished.len() < spawned {
            tracing::warn!(
                "{} of {} concurrent enrichment(s) for {} did not finish in {:?}",
                spawned - finished.len(),
                spawned,
                page.source_url,
                self.timeout
            );
        }

        for (index, asset) in finished {
            page.children[index] = asset;
        }
    }

    /// Enriches pages one at a time
    pub async fn enrich_all(&self, pages: &mut [PageResult]) {
        for page in pages.iter_mut() {
            self.enrich(page).await;
        }
    }
}
