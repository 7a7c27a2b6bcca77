use crate::config::types::{Config, CrawlerConfig, EnrichmentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_enrichment_config(&config.enrichment)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 100 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 100, got {}",
            config.workers
        )));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min-delay-ms ({}) must not exceed max-delay-ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates enrichment configuration
fn validate_enrichment_config(config: &EnrichmentConfig) -> Result<(), ConfigError> {
    if config.max_concurrent < 1 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent must be >= 1, got {}",
            config.max_concurrent
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    validate_threshold("score-threshold", config.score_threshold)?;
    validate_threshold("nms-threshold", config.nms_threshold)?;

    validate_endpoint("ocr-endpoint", &config.ocr_endpoint)?;
    if let Some(endpoint) = &config.detector_endpoint {
        validate_endpoint("detector-endpoint", endpoint)?;
    }
    if let Some(endpoint) = &config.rasterizer_endpoint {
        validate_endpoint("rasterizer-endpoint", endpoint)?;
    }

    Ok(())
}

fn validate_threshold(key: &str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{} must be within 0.0..=1.0, got {}",
            key, value
        )));
    }
    Ok(())
}

/// Endpoints must be absolute http(s) URLs
fn validate_endpoint(key: &str, endpoint: &str) -> Result<(), ConfigError> {
    let url = Url::parse(endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", key, endpoint, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            key, endpoint
        )));
    }

    Ok(())
}
