//! OCR.space text recognition
//!
//! Raster logos are handed to the service by URL. A PNG that reads empty by
//! URL is uploaded instead, flattened onto white and then black when it has
//! transparency. Vector logos, whether inline markup or an SVG behind a URL,
//! are rasterized and take the same upload path. Icons are skipped without
//! calling the service.

use super::composite::{DecodedLogo, BLACK, WHITE};
use super::raster::{RemoteRasterizer, UnsupportedRasterizer};
use super::{Rasterizer, TextRecognizer};
use crate::config::EnrichmentConfig;
use crate::EnrichError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

/// What the service is asked to read
#[derive(Debug, PartialEq)]
enum OcrInput {
    Url(String),
    Base64Png(String),
}

/// What a logo URL serves, judged by its content type
#[derive(Debug, PartialEq)]
enum Served {
    Svg(String),
    Png(Vec<u8>),
    Icon,
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrResponse {
    #[serde(default)]
    parsed_results: Option<Vec<ParsedResult>>,
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: String,
}

/// [`TextRecognizer`] backed by the OCR.space parse API
pub struct OcrSpaceClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    rasterizer: Arc<dyn Rasterizer>,
}

impl OcrSpaceClient {
    pub fn new(
        client: Client,
        endpoint: Url,
        api_key: impl Into<String>,
        rasterizer: Arc<dyn Rasterizer>,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key: api_key.into(),
            rasterizer,
        }
    }

    /// Builds the client from `ocr-endpoint`, the API key and the optional
    /// `rasterizer-endpoint`
    pub fn from_config(client: Client, config: &EnrichmentConfig) -> Result<Self, EnrichError> {
        let endpoint = Url::parse(&config.ocr_endpoint)
            .map_err(|e| EnrichError::Ocr(format!("invalid OCR endpoint: {}", e)))?;

        let rasterizer: Arc<dyn Rasterizer> = match config.rasterizer_endpoint.as_deref() {
            Some(raw) => {
                let raster_endpoint = Url::parse(raw).map_err(|e| {
                    EnrichError::Rasterize(format!("invalid rasterizer endpoint: {}", e))
                })?;
                Arc::new(RemoteRasterizer::new(client.clone(), raster_endpoint))
            }
            None => Arc::new(UnsupportedRasterizer),
        };

        if config.resolved_api_key().is_empty() {
            tracing::warn!("No OCR API key configured, OCR requests will likely be rejected");
        }

        Ok(Self::new(
            client,
            endpoint,
            config.resolved_api_key(),
            rasterizer,
        ))
    }

    /// Reads a flattened PNG, retrying on black when white reads nothing
    async fn recognize_png(&self, png: &[u8]) -> Result<String, EnrichError> {
        let logo = DecodedLogo::decode(png)?;

        let text = self.parse_upload(logo.on_background(WHITE)?).await?;
        if !text.trim().is_empty() || !logo.has_alpha() {
            return Ok(text);
        }

        tracing::debug!("No text on white background, retrying on black");
        self.parse_upload(logo.on_background(BLACK)?).await
    }

    async fn recognize_svg(&self, svg: &str) -> Result<String, EnrichError> {
        let png = self.rasterizer.rasterize(svg).await?;
        self.recognize_png(&png).await
    }

    async fn parse_upload(&self, png: Vec<u8>) -> Result<String, EnrichError> {
        let data_url = format!("data:image/png;base64,{}", STANDARD.encode(png));
        self.parse(OcrInput::Base64Png(data_url)).await
    }

    /// Sniffs the logo's content type; any failure leaves it to the service
    async fn sniff(&self, image_url: &str) -> Served {
        match self.try_sniff(image_url).await {
            Ok(served) => served,
            Err(e) => {
                tracing::debug!(
                    "Content-type check of {} failed, sending URL as is: {}",
                    image_url,
                    e
                );
                Served::Other
            }
        }
    }

    async fn try_sniff(&self, image_url: &str) -> Result<Served, EnrichError> {
        let response = self.client.get(image_url).send().await?;
        if !response.status().is_success() {
            return Err(EnrichError::Ocr(format!("returned {}", response.status())));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.starts_with("image/svg+xml") {
            Ok(Served::Svg(response.text().await?))
        } else if content_type.starts_with("image/png") {
            Ok(Served::Png(response.bytes().await?.to_vec()))
        } else if content_type.starts_with("image/x-icon")
            || content_type.starts_with("image/vnd.microsoft.icon")
        {
            Ok(Served::Icon)
        } else {
            Ok(Served::Other)
        }
    }

    async fn parse(&self, input: OcrInput) -> Result<String, EnrichError> {
        let (field, value) = match input {
            OcrInput::Url(url) => ("url", url),
            OcrInput::Base64Png(data) => ("base64Image", data),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&[("apikey", self.api_key.as_str()), (field, value.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EnrichError::Ocr(format!(
                "OCR service returned {}",
                response.status()
            )));
        }

        let body: OcrResponse = response.json().await?;
        if body.is_errored_on_processing {
            let message = body
                .error_message
                .map(|m| m.to_string())
                .unwrap_or_else(|| "processing failed".to_string());
            return Err(EnrichError::Ocr(message));
        }

        body.parsed_results
            .and_then(|results| results.into_iter().next())
            .map(|result| result.parsed_text)
            .ok_or_else(|| EnrichError::Ocr("no parsed results".to_string()))
    }
}

#[async_trait]
impl TextRecognizer for OcrSpaceClient {
    async fn recognize(&self, raw: &str, is_vector: bool) -> Result<String, EnrichError> {
        if is_vector {
            return self.recognize_svg(raw).await;
        }

        match self.sniff(raw).await {
            Served::Svg(markup) => self.recognize_svg(&markup).await,
            Served::Png(bytes) => {
                let by_url = self.parse(OcrInput::Url(raw.to_string())).await;
                if matches!(&by_url, Ok(text) if !text.trim().is_empty()) {
                    return by_url;
                }

                tracing::debug!("No text read from {} by URL, uploading it", raw);
                match (by_url, self.recognize_png(&bytes).await) {
                    (_, Ok(text)) => Ok(text),
                    (Ok(empty), Err(e)) => {
                        tracing::debug!("Upload of {} failed: {}", raw, e);
                        Ok(empty)
                    }
                    (Err(e), Err(_)) => Err(e),
                }
            }
            Served::Icon => {
                tracing::debug!("Skipping OCR for icon {}", raw);
                Ok(String::new())
            }
            Served::Other => self.parse(OcrInput::Url(raw.to_string())).await,
        }
    }
}
