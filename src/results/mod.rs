//! Result model for harvested pages and assets
//!
//! A crawl returns [`PageResult`]s, each holding the [`AssetResult`]s found on
//! that page. [`CrawlerResult`] is the closed variant root over all three
//! kinds and exposes the two capabilities enrichment needs: whether a result
//! may be enriched concurrently with its siblings, and running enrichment.

use crate::enrich::{AiBackends, Enricher};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};
use url::Url;

/// Axis-aligned box in source image pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection over union with another box
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        let intersection = (right - left).max(0.0) * (bottom - top).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

/// One object found by the detection backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub score: f32,
    pub class_name: String,
}

/// A generic image harvested from a page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageResult {
    pub image_url: String,
    /// Distinct labels of `detections`, set by enrichment
    pub classes: Option<BTreeSet<String>>,
    pub detections: Option<Vec<Detection>>,
}

impl ImageResult {
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            classes: None,
            detections: None,
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.detections.is_some()
    }

    /// Runs object detection and stores the detections and their labels
    ///
    /// Failures leave both fields untouched.
    pub async fn enrich(&mut self, backends: &AiBackends) {
        let url = match Url::parse(&self.image_url) {
            Ok(url) => url,
            Err(e) => {
                debug!("Skipping detection for unparsable URL {}: {}", self.image_url, e);
                return;
            }
        };

        match backends.detector.detect(&url).await {
            Ok(detections) => {
                let classes = detections
                    .iter()
                    .map(|d| d.class_name.clone())
                    .collect::<BTreeSet<_>>();
                debug!(
                    "Detected {} objects in {}",
                    detections.len(),
                    self.image_url
                );
                self.classes = Some(classes);
                self.detections = Some(detections);
            }
            Err(e) => warn!("Object detection failed for {}: {}", self.image_url, e),
        }
    }
}

/// A logo or favicon harvested from a page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogoResult {
    /// Image URL, or the inline `<svg>` markup for vector logos
    pub raw_data: String,
    pub is_vector: bool,
    pub recognized_text: Option<String>,
}

impl LogoResult {
    pub fn raster(url: impl Into<String>) -> Self {
        Self {
            raw_data: url.into(),
            is_vector: false,
            recognized_text: None,
        }
    }

    pub fn vector(markup: impl Into<String>) -> Self {
        Self {
            raw_data: markup.into(),
            is_vector: true,
            recognized_text: None,
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.recognized_text.is_some()
    }

    /// Runs text recognition on the logo
    ///
    /// Failures leave `recognized_text` untouched.
    pub async fn enrich(&mut self, backends: &AiBackends) {
        match backends
            .recognizer
            .recognize(&self.raw_data, self.is_vector)
            .await
        {
            Ok(text) => self.recognized_text = Some(text.trim().to_string()),
            Err(e) => warn!("Text recognition failed for logo: {}", e),
        }
    }
}

/// Any asset harvested from a page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetResult {
    Image(ImageResult),
    Logo(LogoResult),
}

impl AssetResult {
    /// Identity used by the crawl-wide dedup set
    pub fn asset_key(&self) -> &str {
        match self {
            Self::Image(image) => &image.image_url,
            Self::Logo(logo) => &logo.raw_data,
        }
    }

    /// Logos hit a remote OCR service and may share the async pool; images
    /// go through the single shared detector one at a time.
    pub fn runs_concurrently(&self) -> bool {
        matches!(self, Self::Logo(_))
    }

    pub async fn enrich(&mut self, backends: &AiBackends) {
        match self {
            Self::Image(image) => image.enrich(backends).await,
            Self::Logo(logo) => logo.enrich(backends).await,
        }
    }
}

/// One fetched page and the assets it yielded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult {
    pub source_url: String,
    pub children: Vec<AssetResult>,
}

impl PageResult {
    /// Wraps a page's assets, or returns `None` when it yielded nothing
    pub fn from_assets(source_url: impl Into<String>, children: Vec<AssetResult>) -> Option<Self> {
        if children.is_empty() {
            None
        } else {
            Some(Self {
                source_url: source_url.into(),
                children,
            })
        }
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageResult> {
        self.children.iter().filter_map(|c| match c {
            AssetResult::Image(image) => Some(image),
            AssetResult::Logo(_) => None,
        })
    }

    pub fn logos(&self) -> impl Iterator<Item = &LogoResult> {
        self.children.iter().filter_map(|c| match c {
            AssetResult::Logo(logo) => Some(logo),
            AssetResult::Image(_) => None,
        })
    }
}

/// Closed variant root over pages, images and logos
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CrawlerResult {
    Page(PageResult),
    Image(ImageResult),
    Logo(LogoResult),
}

impl CrawlerResult {
    /// Whether this result may be enriched concurrently with its siblings
    pub fn runs_concurrently(&self) -> bool {
        match self {
            Self::Page(_) | Self::Image(_) => false,
            Self::Logo(_) => true,
        }
    }

    /// Runs enrichment now; a page dispatches all of its children
    pub async fn enrich(&mut self, enricher: &Enricher) {
        match self {
            Self::Page(page) => enricher.enrich(page).await,
            Self::Image(image) => image.enrich(enricher.backends()).await,
            Self::Logo(logo) => logo.enrich(enricher.backends()).await,
        }
    }
}

impl From<PageResult> for CrawlerResult {
    fn from(page: PageResult) -> Self {
        Self::Page(page)
    }
}

impl From<AssetResult> for CrawlerResult {
    fn from(asset: AssetResult) -> Self {
        match asset {
            AssetResult::Image(image) => Self::Image(image),
            AssetResult::Logo(logo) => Self::Logo(logo),
        }
    }
}
