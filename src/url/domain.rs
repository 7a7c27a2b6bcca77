use url::Url;

/// Extracts the host from a URL
///
/// The host is lowercased so that comparisons against the origin host are
/// exact string comparisons.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use image_finder::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("mailto:someone@example.com").unwrap();
/// assert_eq!(extract_host(&url), None);
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}
