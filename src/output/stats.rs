//! Run summaries computed from crawl results

use crate::results::{AssetResult, PageResult};
use serde::Serialize;

/// Counts over a set of page results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    /// Pages that yielded at least one asset
    pub pages: usize,

    pub images: usize,

    pub logos: usize,

    /// Logos stored as inline markup
    pub vector_logos: usize,

    /// Images with a detection result, possibly empty
    pub images_with_detections: usize,

    /// Logos with a recognized text, possibly empty
    pub logos_with_text: usize,
}

impl CrawlSummary {
    pub fn from_pages(pages: &[PageResult]) -> Self {
        let mut summary = Self {
            pages: pages.len(),
            ..Self::default()
        };

        for child in pages.iter().flat_map(|p| &p.children) {
            match child {
                AssetResult::Image(image) => {
                    summary.images += 1;
                    if image.is_enriched() {
                        summary.images_with_detections += 1;
                    }
                }
                AssetResult::Logo(logo) => {
                    summary.logos += 1;
                    if logo.is_vector {
                        summary.vector_logos += 1;
                    }
                    if logo.is_enriched() {
                        summary.logos_with_text += 1;
                    }
                }
            }
        }

        summary
    }

    pub fn total_assets(&self) -> usize {
        self.images + self.logos
    }
}

/// Logs a one-line summary of the run
pub fn log_summary(summary: &CrawlSummary) {
    tracing::info!(
        "Summary: {} page(s), {} asset(s) ({} image(s), {} logo(s), {} vector), \
         {} image(s) with detections, {} logo(s) with text",
        summary.pages,
        summary.total_assets(),
        summary.images,
        summary.logos,
        summary.vector_logos,
        summary.images_with_detections,
        summary.logos_with_text
    );
}
