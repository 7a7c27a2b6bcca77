//! Remote object detection
//!
//! The inference service returns raw candidates for an image URL. Score
//! filtering, non-maximum suppression and label mapping happen here so that
//! the service can stay a thin wrapper around the model.

use super::labels::class_label;
use super::ObjectDetector;
use crate::config::EnrichmentConfig;
use crate::results::{BoundingBox, Detection};
use crate::EnrichError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use url::Url;

#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    url: &'a str,
}

/// Raw candidate as produced by the model
#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    class_id: usize,
    score: f32,
    /// `[x, y, width, height]` in source image pixels
    bbox: [f64; 4],
}

impl Candidate {
    fn into_detection(self) -> Detection {
        let [x, y, width, height] = self.bbox;
        Detection {
            bbox: BoundingBox {
                x,
                y,
                width,
                height,
            },
            score: self.score,
            class_name: class_label(self.class_id),
        }
    }
}

/// [`ObjectDetector`] that posts image URLs to an inference endpoint
#[derive(Debug, Clone)]
pub struct RemoteDetector {
    client: Client,
    endpoint: Url,
    score_threshold: f32,
    nms_threshold: f32,
}

impl RemoteDetector {
    pub fn new(client: Client, endpoint: Url, score_threshold: f32, nms_threshold: f32) -> Self {
        Self {
            client,
            endpoint,
            score_threshold,
            nms_threshold,
        }
    }

    /// Builds a detector from `detector-endpoint`
    ///
    /// Fails when no endpoint is configured.
    pub fn from_config(client: Client, config: &EnrichmentConfig) -> Result<Self, EnrichError> {
        let endpoint = config
            .detector_endpoint
            .as_deref()
            .ok_or_else(|| EnrichError::Detection("no detector endpoint configured".to_string()))?;
        let endpoint = Url::parse(endpoint)
            .map_err(|e| EnrichError::Detection(format!("invalid detector endpoint: {}", e)))?;

        Ok(Self::new(
            client,
            endpoint,
            config.score_threshold,
            config.nms_threshold,
        ))
    }
}

#[async_trait]
impl ObjectDetector for RemoteDetector {
    async fn detect(&self, image_url: &Url) -> Result<Vec<Detection>, EnrichError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&DetectRequest {
                url: image_url.as_str(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichError::Detection(format!(
                "detector returned {}: {}",
                status, body
            )));
        }

        let candidates: Vec<Candidate> = response.json().await?;
        tracing::trace!("{} candidate(s) for {}", candidates.len(), image_url);

        let detections = candidates
            .into_iter()
            .map(Candidate::into_detection)
            .collect();

        Ok(non_max_suppression(
            detections,
            self.score_threshold,
            self.nms_threshold,
        ))
    }
}

/// Greedy class-agnostic non-maximum suppression
///
/// Drops detections scoring below `score_threshold`, then keeps detections
/// in descending score order unless they overlap an already kept one with
/// IoU above `nms_threshold`.
pub fn non_max_suppression(
    mut detections: Vec<Detection>,
    score_threshold: f32,
    nms_threshold: f32,
) -> Vec<Detection> {
    detections.retain(|d| d.score >= score_threshold);
    detections.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for detection in detections {
        let overlaps = kept
            .iter()
            .any(|k| k.bbox.iou(&detection.bbox) > f64::from(nms_threshold));
        if !overlaps {
            kept.push(detection);
        }
    }
    kept
}
