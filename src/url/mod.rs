//! URL handling module for Image-Finder
//!
//! This module parses the crawl's start URL, resolves hrefs and srcs against
//! the page they were found on, and decides which discovered links stay
//! inside the crawl.

mod domain;
mod link;

pub use domain::extract_host;
pub use link::{is_crawlable_link, is_fragment_anchor, resolve_reference};

use crate::ImageFinderError;
use url::Url;

/// Parses the crawl's start URL
///
/// The URL must be absolute, use `http` or `https`, and carry a host.
///
/// # Returns
///
/// * `Ok((Url, String))` - The parsed URL and its origin host
/// * `Err(ImageFinderError::InvalidUrl)` - The URL cannot be crawled
///
/// # Examples
///
/// ```
/// use image_finder::url::parse_start_url;
///
/// let (url, host) = parse_start_url("https://example.com/gallery").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/gallery");
/// assert_eq!(host, "example.com");
///
/// assert!(parse_start_url("not a url").is_err());
/// ```
pub fn parse_start_url(start_url: &str) -> Result<(Url, String), ImageFinderError> {
    let invalid = |reason: String| ImageFinderError::InvalidUrl {
        url: start_url.to_string(),
        reason,
    };

    let url = Url::parse(start_url.trim()).map_err(|e| invalid(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }

    let host = extract_host(&url).ok_or_else(|| invalid("missing host".to_string()))?;

    Ok((url, host))
}
