//! Crawler module for breadth-first asset harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the [`PageFetcher`] seam
//! - HTML extraction of favicons, logos, images and links
//! - The frontier, politeness delay and bounded worker pool
//! - Layer-by-layer crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::{crawl, Crawler};
pub use fetcher::{build_http_client, fetch_url, FetchedPage, HttpFetcher, PageFetcher};
pub use parser::{extract_page, ExtractionContext, PageExtraction};
pub use scheduler::{Frontier, PolitenessDelay, WorkerPool};
