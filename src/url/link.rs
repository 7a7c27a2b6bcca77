use super::extract_host;
use url::Url;

/// Resolves an href or src attribute against the page it was found on
///
/// Returns `None` for empty values and for references that cannot be joined
/// onto the base URL.
pub fn resolve_reference(raw: &str, base_url: &Url) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    base_url.join(raw).ok()
}

/// Returns true for in-page anchors appended directly after a path separator
///
/// `https://example.com/#about` and `https://example.com/docs/#intro` are
/// anchors on an index page; `https://example.com/page#intro` is a page.
pub fn is_fragment_anchor(link: &str) -> bool {
    match link.rfind('/') {
        Some(idx) => link[idx + 1..].starts_with('#'),
        None => false,
    }
}

/// Decides whether a discovered link is enqueued for the next BFS layer
///
/// The link's host must equal the origin host exactly (subdomains are other
/// hosts) and it must not be a fragment anchor.
pub fn is_crawlable_link(link: &Url, origin_host: &str) -> bool {
    match extract_host(link) {
        Some(host) if host == origin_host => !is_fragment_anchor(link.as_str()),
        _ => false,
    }
}
