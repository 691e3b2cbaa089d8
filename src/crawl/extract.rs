// src/crawl/extract.rs
// =============================================================================
// This module extracts image sources and internal links from HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser), so malformed markup
//   never errors - it parses leniently like a browser would
//
// We also use the `url` crate to:
// - Resolve relative URLs against the page they appeared on
// - Compare origins (scheme + host) between two URLs
// =============================================================================

use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

// Extracts all <img> source URLs from HTML content, in document order
//
// Parameters:
//   html: the HTML content to parse (borrowed as &str)
//   page_url: the URL the HTML was fetched from (for resolving relative srcs)
//
// Returns: Vec<String> of absolute image URLs, first-seen order preserved
//
// Example:
//   html = "<img src='/logo.png'>"
//   page_url = "https://example.com/about"
//   result = ["https://example.com/logo.png"]
pub fn extract_image_urls(html: &str, page_url: &Url) -> Vec<String> {
    let mut images = Vec::new();

    let document = Html::parse_document(html);

    // Selector::parse returns Result, so we use .unwrap() which panics on
    // error. This is OK here because our selector is a constant and known
    // to be valid.
    let selector = Selector::parse("img[src]").unwrap();

    for element in document.select(&selector) {
        if let Some(src) = element.value().attr("src") {
            // Relative srcs resolve against the page they were found on,
            // not against the crawl's starting URL
            if let Some(absolute) = resolve_url(page_url, src) {
                images.push(absolute);
            }
        }
    }

    images
}

// Extracts all same-origin links from HTML content
//
// The crawler must never leave the site it started on, so anything whose
// resolved origin differs from the page's origin is dropped here.
//
// Parameters:
//   html: the HTML content to parse
//   page_url: the URL of the current page (for resolving relative hrefs)
//
// Returns: de-duplicated Vec<String> of absolute same-origin URLs
pub fn extract_internal_links(html: &str, page_url: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").unwrap();

    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            let absolute = match resolve_url(page_url, href) {
                Some(url) => url,
                None => continue,
            };

            if let Ok(parsed) = Url::parse(&absolute) {
                if same_origin(page_url, &parsed) && seen.insert(absolute.clone()) {
                    links.push(absolute);
                }
            }
        }
    }

    links
}

// Checks whether two URLs share an origin
//
// Origin here means scheme + host. The port is deliberately ignored, so
// https://example.com and https://example.com:8443 count as the same site.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme() && a.host_str() == b.host_str()
}

// Computes the lowercased file extension of a URL
//
// The extension is the substring after the last '.', with any query string
// or fragment stripped first.
//
// Parameters:
//   url: an absolute URL string
//
// Returns: Some(extension) or None when there is no usable extension
//
// Examples:
//   "https://x.com/a/photo.JPG?w=200" -> Some("jpg")
//   "https://x.com/a/photo"           -> None
pub fn image_extension(url: &str) -> Option<String> {
    // Everything after '?' or '#' is not part of the filename
    let without_query = url.split(['?', '#']).next().unwrap_or(url);

    let (_, ext) = without_query.rsplit_once('.')?;

    // A '/' after the last dot means the dot belonged to a path segment,
    // e.g. "https://x.com/v1.2/photo"
    if ext.is_empty() || ext.contains('/') {
        return None;
    }

    Some(ext.to_ascii_lowercase())
}

// Resolves a possibly-relative URL to an absolute URL
//
// Parameters:
//   base: the URL of the current page
//   href: the href/src value (might be relative, might be absolute)
//
// Returns: Some(absolute_url) or None for anchors, mailto:, invalid URLs etc.
fn resolve_url(base: &Url, href: &str) -> Option<String> {
    // Skip anchors and non-fetchable protocols
    if href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
        || href.starts_with("data:")
    {
        return None;
    }

    // Url::join handles both cases: absolute hrefs replace the base,
    // relative hrefs resolve against it (like a browser does)
    match base.join(href) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url.to_string()),
        _ => None,
    }
}
