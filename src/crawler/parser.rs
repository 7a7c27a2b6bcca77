//! HTML extraction of assets and links
//!
//! This module applies the harvesting heuristics to one parsed page:
//! - Favicons from `<link rel="icon">` (start page only)
//! - Logos: inline `<svg>` and raster `<img>` inside elements tagged "logo"
//! - Generic `<img>` sources
//! - Same-origin links for the next BFS layer
//!
//! Every candidate goes through the crawl-wide [`AssetLedger`]. As soon as the
//! ledger reports the budget spent, the remaining steps for this page are
//! skipped; assets already accepted on this page are kept.

use crate::results::{AssetResult, ImageResult, LogoResult};
use crate::state::{AssetLedger, Claim};
use crate::url::{is_crawlable_link, resolve_reference};
use scraper::{ElementRef, Html, Selector};
use std::ops::ControlFlow;
use url::Url;

/// Element kinds that may carry a logo marker
const LOGO_TAGS: &[&str] = &["img", "a", "div"];

/// Attributes searched for the "logo" substring
const LOGO_ATTRIBUTES: &[&str] = &["class", "id", "data-testid", "aria-label", "data-link-name"];

/// Attributes holding an image source, in order of preference
const SOURCE_ATTRIBUTES: &[&str] = &["src", "data-src"];

/// Everything harvested from one page
#[derive(Debug, Default)]
pub struct PageExtraction {
    /// Accepted assets in extraction order
    pub assets: Vec<AssetResult>,

    /// Same-origin links to enqueue
    pub links: Vec<Url>,

    /// True when extraction stopped early on the asset budget
    pub budget_exhausted: bool,
}

/// Page-independent inputs of the extraction
pub struct ExtractionContext<'a> {
    pub origin_host: &'a str,
    pub ledger: &'a AssetLedger,
    /// Favicons are only harvested from the crawl's start page
    pub is_start_page: bool,
}

/// Parses a page and harvests its assets and links
///
/// Link discovery is skipped when the budget ran out mid-page, since the
/// crawl stops at the next layer boundary anyway.
///
/// # Example
///
/// ```
/// use image_finder::crawler::{extract_page, ExtractionContext};
/// use image_finder::state::AssetLedger;
/// use url::Url;
///
/// let html = r#"<html><body><img src="/cat.png"><a href="/next">Next</a></body></html>"#;
/// let page_url = Url::parse("https://example.com/").unwrap();
/// let ledger = AssetLedger::new(10);
/// let ctx = ExtractionContext { origin_host: "example.com", ledger: &ledger, is_start_page: true };
///
/// let extraction = extract_page(html, &page_url, &ctx);
/// assert_eq!(extraction.assets.len(), 1);
/// assert_eq!(extraction.links[0].as_str(), "https://example.com/next");
/// ```
pub fn extract_page(html: &str, page_url: &Url, ctx: &ExtractionContext<'_>) -> PageExtraction {
    let document = Html::parse_document(html);
    let mut extraction = PageExtraction::default();

    if harvest_assets(&document, page_url, ctx, &mut extraction.assets).is_break() {
        extraction.budget_exhausted = true;
        return extraction;
    }

    extraction.links = extract_links(&document, page_url, ctx.origin_host);
    extraction
}

fn harvest_assets(
    document: &Html,
    page_url: &Url,
    ctx: &ExtractionContext<'_>,
    assets: &mut Vec<AssetResult>,
) -> ControlFlow<()> {
    if ctx.is_start_page {
        extract_favicons(document, page_url, ctx.ledger, assets)?;
    }
    extract_logos(document, page_url, ctx.ledger, assets)?;
    extract_images(document, page_url, ctx.ledger, assets)
}

/// Offers one candidate to the ledger
fn offer(ledger: &AssetLedger, asset: AssetResult, assets: &mut Vec<AssetResult>) -> ControlFlow<()> {
    match ledger.claim(asset.asset_key()) {
        Claim::Accepted => {
            tracing::trace!("Accepted asset {}", asset.asset_key());
            assets.push(asset);
            ControlFlow::Continue(())
        }
        Claim::Duplicate => ControlFlow::Continue(()),
        Claim::BudgetExhausted => ControlFlow::Break(()),
    }
}

fn extract_favicons(
    document: &Html,
    page_url: &Url,
    ledger: &AssetLedger,
    assets: &mut Vec<AssetResult>,
) -> ControlFlow<()> {
    let Ok(selector) = Selector::parse("link[rel~='icon'][href]") else {
        return ControlFlow::Continue(());
    };

    for element in document.select(&selector) {
        let href = element.value().attr("href").unwrap_or_default();
        if let Some(url) = resolve_reference(href, page_url) {
            offer(ledger, AssetResult::Logo(LogoResult::raster(url)), assets)?;
        }
    }

    ControlFlow::Continue(())
}

/// Builds `img[class*='logo'], img[id*='logo'], ..., div[data-link-name*='logo']`
fn logo_selector() -> String {
    LOGO_TAGS
        .iter()
        .flat_map(|tag| {
            LOGO_ATTRIBUTES
                .iter()
                .map(move |attr| format!("{}[{}*='logo']", tag, attr))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn extract_logos(
    document: &Html,
    page_url: &Url,
    ledger: &AssetLedger,
    assets: &mut Vec<AssetResult>,
) -> ControlFlow<()> {
    let (Ok(logo_selector), Ok(svg_selector), Ok(img_selector)) = (
        Selector::parse(&logo_selector()),
        Selector::parse("svg"),
        Selector::parse("img"),
    ) else {
        return ControlFlow::Continue(());
    };

    for logo in document.select(&logo_selector) {
        for svg in self_and_descendants(logo, &svg_selector, "svg") {
            offer(ledger, AssetResult::Logo(LogoResult::vector(svg.html())), assets)?;
        }

        for img in self_and_descendants(logo, &img_selector, "img") {
            if let Some(url) = image_source(img, page_url) {
                offer(ledger, AssetResult::Logo(LogoResult::raster(url)), assets)?;
            }
        }
    }

    ControlFlow::Continue(())
}

fn extract_images(
    document: &Html,
    page_url: &Url,
    ledger: &AssetLedger,
    assets: &mut Vec<AssetResult>,
) -> ControlFlow<()> {
    let Ok(selector) = Selector::parse("img[src], img[data-src]") else {
        return ControlFlow::Continue(());
    };

    for img in document.select(&selector) {
        if let Some(url) = image_source(img, page_url) {
            offer(ledger, AssetResult::Image(ImageResult::new(url)), assets)?;
        }
    }

    ControlFlow::Continue(())
}

/// `ElementRef::select` only walks descendants; a logo marker sitting on the
/// `<img>` or `<svg>` itself must match too.
fn self_and_descendants<'a>(
    element: ElementRef<'a>,
    selector: &'a Selector,
    tag: &str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    let own = (element.value().name() == tag).then_some(element);
    own.into_iter().chain(element.select(selector))
}

/// Absolute image source, preferring `src` over the lazy-load `data-src`
fn image_source(img: ElementRef<'_>, page_url: &Url) -> Option<String> {
    SOURCE_ATTRIBUTES
        .iter()
        .filter_map(|attr| img.value().attr(attr))
        .find_map(|raw| resolve_reference(raw, page_url))
        .map(|url| url.to_string())
}

/// Extracts same-origin links from `<a href>` elements
fn extract_links(document: &Html, page_url: &Url, origin_host: &str) -> Vec<Url> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_reference(href, page_url))
        .filter(|link| is_crawlable_link(link, origin_host))
        .collect()
}
