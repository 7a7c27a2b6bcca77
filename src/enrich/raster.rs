use super::Rasterizer;
use crate::EnrichError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use url::Url;

/// [`Rasterizer`] backed by an SVG to PNG conversion service
#[derive(Debug, Clone)]
pub struct RemoteRasterizer {
    client: Client,
    endpoint: Url,
}

impl RemoteRasterizer {
    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl Rasterizer for RemoteRasterizer {
    async fn rasterize(&self, svg: &str) -> Result<Vec<u8>, EnrichError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "image/svg+xml")
            .body(svg.to_string())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EnrichError::Rasterize(format!(
                "rasterizer returned {}",
                response.status()
            )));
        }

        let png = response.bytes().await?;
        if png.is_empty() {
            return Err(EnrichError::Rasterize("empty image".to_string()));
        }
        Ok(png.to_vec())
    }
}

/// Used when no rasterizer endpoint is configured; vector logos stay unread
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedRasterizer;

#[async_trait]
impl Rasterizer for UnsupportedRasterizer {
    async fn rasterize(&self, _svg: &str) -> Result<Vec<u8>, EnrichError> {
        Err(EnrichError::Rasterize(
            "no rasterizer endpoint configured".to_string(),
        ))
    }
}
