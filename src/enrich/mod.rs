//! Enrichment of harvested assets with AI backends
//!
//! This module contains:
//! - The backend seams: [`ObjectDetector`], [`TextRecognizer`], [`Rasterizer`]
//! - Remote implementations of each backend
//! - The [`Enricher`] that fans a page's children out under a shared bound
//!
//! Backend failures never leave this module as errors. A failed or timed out
//! enrichment leaves the asset's optional fields unset.

mod composite;
mod detector;
mod dispatch;
mod labels;
mod ocr;
mod raster;

pub use detector::{non_max_suppression, RemoteDetector};
pub use dispatch::Enricher;
pub use labels::{class_label, COCO_LABELS};
pub use ocr::OcrSpaceClient;
pub use raster::{RemoteRasterizer, UnsupportedRasterizer};

use crate::config::EnrichmentConfig;
use crate::results::Detection;
use crate::EnrichError;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use url::Url;

/// Finds objects in the image behind a URL
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    async fn detect(&self, image_url: &Url) -> Result<Vec<Detection>, EnrichError>;
}

/// Reads text from a logo
///
/// `raw` is an image URL, or inline vector markup when `is_vector` is set.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, raw: &str, is_vector: bool) -> Result<String, EnrichError>;
}

/// Converts vector markup into PNG bytes
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(&self, svg: &str) -> Result<Vec<u8>, EnrichError>;
}

/// Process-wide backend instances shared by every enrichment
#[derive(Clone)]
pub struct AiBackends {
    pub detector: Arc<dyn ObjectDetector>,
    pub recognizer: Arc<dyn TextRecognizer>,
}

impl AiBackends {
    pub fn new(detector: Arc<dyn ObjectDetector>, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            detector,
            recognizer,
        }
    }

    /// Builds the remote detector and the OCR.space client
    ///
    /// Fails when `detector-endpoint` is unset or an endpoint does not parse.
    pub fn from_config(config: &EnrichmentConfig) -> Result<Self, EnrichError> {
        let client = build_backend_client(config)?;
        let detector = RemoteDetector::from_config(client.clone(), config)?;
        let recognizer = OcrSpaceClient::from_config(client, config)?;
        Ok(Self::new(Arc::new(detector), Arc::new(recognizer)))
    }
}

/// HTTP client shared by the remote backends
///
/// Each request is capped at the enrichment timeout.
pub fn build_backend_client(config: &EnrichmentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("image-finder/", env!("CARGO_PKG_VERSION")))
        .timeout(config.timeout())
        .build()
}

impl std::fmt::Debug for AiBackends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiBackends").finish_non_exhaustive()
    }
}
