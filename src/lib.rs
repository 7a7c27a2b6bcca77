//! Image-Finder: a same-site visual asset harvester
//!
//! This crate crawls a website breadth-first, harvesting favicons, logos and
//! images under a global asset budget, and can enrich the harvested items with
//! object detection and text recognition backends.

pub mod config;
pub mod crawler;
pub mod enrich;
pub mod output;
pub mod results;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Image-Finder operations
#[derive(Debug, Error)]
pub enum ImageFinderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid start URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Per-page fetch failures. Always recovered by skipping the page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Expected HTML from {url}, got '{content_type}'")]
    NotHtml { url: String, content_type: String },
}

/// Failures of the AI backends. Never surfaced past the enricher.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Object detection failed: {0}")]
    Detection(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("SVG rasterization failed: {0}")]
    Rasterize(String),
}

/// Result type alias for Image-Finder operations
pub type Result<T> = std::result::Result<T, ImageFinderError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, Crawler};
pub use enrich::{AiBackends, Enricher};
pub use results::{AssetResult, CrawlerResult, ImageResult, LogoResult, PageResult};
