//! Scheduling primitives for the crawl
//!
//! This module handles:
//! - The shared FIFO frontier that page tasks feed with discovered links
//! - The randomized politeness delay paid by each page task
//! - A bounded worker pool with a completion barrier and a deadline drain

use crate::config::CrawlerConfig;
use rand::Rng;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use url::Url;

/// FIFO of URLs waiting for a BFS layer
///
/// Page tasks extend it while the coordinator pops, so the queue sits behind
/// a mutex that is only held for a single extend or pop.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: Mutex<VecDeque<Url>>,
}

impl Frontier {
    pub fn new(seed: Url) -> Self {
        Self {
            queue: Mutex::new(VecDeque::from([seed])),
        }
    }

    pub fn extend(&self, urls: impl IntoIterator<Item = Url>) {
        self.lock().extend(urls);
    }

    pub fn pop(&self) -> Option<Url> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Url>> {
        // A panicking task cannot leave a VecDeque half-updated
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Uniformly random pause before each fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolitenessDelay {
    min_ms: u64,
    max_ms: u64,
}

impl PolitenessDelay {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: max_ms.max(min_ms),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.min_delay_ms, config.max_delay_ms)
    }

    pub fn none() -> Self {
        Self::new(0, 0)
    }

    pub fn sample(&self) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::rng().random_range(self.min_ms..=self.max_ms))
    }

    pub async fn wait(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tracing::trace!("Waiting {:?} before fetch", delay);
            tokio::time::sleep(delay).await;
        }
    }
}

/// Tasks whose concurrency is bounded by a semaphore
///
/// Every spawned task holds one permit while it runs. The semaphore may be
/// private to the pool or shared between pools, in which case the bound
/// applies across all of them while each pool keeps its own wait group.
pub struct WorkerPool<T> {
    permits: Arc<Semaphore>,
    tasks: JoinSet<T>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Creates a pool running at most `size` tasks at once
    pub fn new(size: usize) -> Self {
        Self::with_permits(Arc::new(Semaphore::new(size.max(1))))
    }

    /// Creates a pool drawing permits from a shared semaphore
    pub fn with_permits(permits: Arc<Semaphore>) -> Self {
        Self {
            permits,
            tasks: JoinSet::new(),
        }
    }

    /// Number of tasks spawned and not yet collected
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        self.tasks.spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::error!("Worker pool semaphore closed unexpectedly");
                    None
                }
            };
            task.await
        });
    }

    /// Waits for every spawned task and returns outputs in completion order
    pub async fn barrier(&mut self) -> Vec<T> {
        let mut outputs = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            collect(joined, &mut outputs);
        }
        outputs
    }

    /// Waits for spawned tasks until `grace` elapses, then cancels the rest
    ///
    /// Outputs of tasks that finished in time are returned in completion
    /// order; cancelled tasks contribute nothing.
    pub async fn drain(&mut self, grace: Duration) -> Vec<T> {
        let deadline = Instant::now() + grace;
        let mut outputs = Vec::with_capacity(self.tasks.len());

        loop {
            match tokio::time::timeout_at(deadline, self.tasks.join_next()).await {
                Ok(Some(joined)) => collect(joined, &mut outputs),
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        "Cancelling {} task(s) still running after {:?}",
                        self.tasks.len(),
                        grace
                    );
                    self.tasks.abort_all();
                    while self.tasks.join_next().await.is_some() {}
                    break;
                }
            }
        }

        outputs
    }
}

fn collect<T>(joined: Result<T, JoinError>, outputs: &mut Vec<T>) {
    match joined {
        Ok(output) => outputs.push(output),
        Err(e) if e.is_cancelled() => tracing::debug!("Task cancelled: {}", e),
        Err(e) => tracing::error!("Task panicked: {}", e),
    }
}
