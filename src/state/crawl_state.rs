use dashmap::DashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Page URLs already claimed by a task in this run
#[derive(Debug, Default)]
pub struct VisitedPages {
    urls: DashSet<String>,
}

impl VisitedPages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claims a URL; returns false if another task got there first
    pub fn claim(&self, url: &str) -> bool {
        self.urls.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Outcome of offering a candidate asset to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// First sighting; the caller owns this asset
    Accepted,
    /// Already collected somewhere in this run
    Duplicate,
    /// The run's budget is spent; stop extracting
    BudgetExhausted,
}

/// Crawl-wide set of collected asset keys plus the asset budget
///
/// The budget check reads the collected counter and the insert happens afterwards
/// without a lock spanning both, so tasks racing through [`AssetLedger::claim`]
/// can each pass the check before any of them inserts. The collected count
/// may therefore exceed `max_assets` by up to the number of concurrent
/// workers.
#[derive(Debug)]
pub struct AssetLedger {
    keys: DashSet<String>,
    collected: AtomicUsize,
    max_assets: usize,
}

impl AssetLedger {
    pub fn new(max_assets: usize) -> Self {
        Self {
            keys: DashSet::new(),
            collected: AtomicUsize::new(0),
            max_assets,
        }
    }

    pub fn max_assets(&self) -> usize {
        self.max_assets
    }

    pub fn collected(&self) -> usize {
        self.collected.load(Ordering::SeqCst)
    }

    pub fn is_exhausted(&self) -> bool {
        self.collected() >= self.max_assets
    }

    /// Checks the budget, then inserts the key if it is new
    pub fn claim(&self, key: &str) -> Claim {
        if self.is_exhausted() {
            return Claim::BudgetExhausted;
        }

        if self.keys.insert(key.to_string()) {
            self.collected.fetch_add(1, Ordering::SeqCst);
            Claim::Accepted
        } else {
            Claim::Duplicate
        }
    }
}
