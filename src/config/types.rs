use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Image-Finder
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Deepest BFS level processed; levels run from 0 to this value inclusive
    pub max_depth: u32,

    /// Size of the bounded worker pool shared by the whole run
    pub workers: u32,

    /// Lower bound of the randomized delay before each fetch (milliseconds)
    pub min_delay_ms: u64,

    /// Upper bound of the randomized delay before each fetch (milliseconds)
    pub max_delay_ms: u64,

    /// Grace period for in-flight tasks when the run drains (seconds)
    pub drain_grace_secs: u64,

    /// Per-request timeout for page fetches (seconds)
    pub request_timeout_secs: u64,

    /// User agent sent with every page fetch
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            workers: 10,
            min_delay_ms: 1000,
            max_delay_ms: 5000,
            drain_grace_secs: 15,
            request_timeout_secs: 30,
            user_agent: format!("image-finder/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CrawlerConfig {
    pub fn drain_grace(&self) -> Duration {
        Duration::from_secs(self.drain_grace_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// AI enrichment configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EnrichmentConfig {
    /// Ceiling on the wait for concurrent enrichment of one page (seconds)
    pub timeout_secs: u64,

    /// Bound on concurrent enrichment tasks across all pages
    pub max_concurrent: u32,

    /// OCR.space compatible endpoint
    pub ocr_endpoint: String,

    /// OCR API key; empty means "read OCR_API_KEY from the environment"
    pub ocr_api_key: String,

    /// Object detection inference endpoint
    pub detector_endpoint: Option<String>,

    /// SVG to PNG conversion endpoint
    pub rasterizer_endpoint: Option<String>,

    /// Minimum confidence for a detection candidate
    pub score_threshold: f32,

    /// IoU above which overlapping detections are suppressed
    pub nms_threshold: f32,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_concurrent: 32,
            ocr_endpoint: "https://api.ocr.space/parse/image".to_string(),
            ocr_api_key: String::new(),
            detector_endpoint: None,
            rasterizer_endpoint: None,
            score_threshold: 0.3,
            nms_threshold: 0.5,
        }
    }
}

impl EnrichmentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the configured API key, falling back to `OCR_API_KEY`
    pub fn resolved_api_key(&self) -> String {
        if self.ocr_api_key.is_empty() {
            std::env::var("OCR_API_KEY").unwrap_or_default()
        } else {
            self.ocr_api_key.clone()
        }
    }
}
