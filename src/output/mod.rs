//! Output module for crawl results
//!
//! This module handles:
//! - Rendering page results as JSON for the CLI
//! - Computing and logging run summaries

pub mod stats;

pub use stats::{log_summary, CrawlSummary};

use crate::results::PageResult;
use std::io::Write;

/// Renders page results as pretty-printed JSON
///
/// # Example
///
/// ```
/// use image_finder::output::render_json;
/// use image_finder::{AssetResult, ImageResult, PageResult};
///
/// let page = PageResult::from_assets(
///     "https://example.com/",
///     vec![AssetResult::Image(ImageResult::new("https://example.com/cat.png"))],
/// )
/// .unwrap();
///
/// let json = render_json(&[page]).unwrap();
/// assert!(json.contains("\"kind\": \"image\""));
/// ```
pub fn render_json(pages: &[PageResult]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(pages)
}

/// Writes page results as pretty-printed JSON followed by a newline
pub fn write_json<W: Write>(writer: &mut W, pages: &[PageResult]) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, pages)?;
    writeln!(writer)
}
