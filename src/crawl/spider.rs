// src/crawl/spider.rs
// =============================================================================
// This module implements the breadth-first image crawl.
//
// How it works:
// 1. Start with the initial URL in a FIFO queue (the frontier)
// 2. Fetch the page HTML with a short timeout
// 3. Collect <img> sources whose extension is in the allowed set
// 4. Add unvisited same-origin links to the frontier
// 5. Repeat until the image cap is hit or the frontier is exhausted
//
// Bounds:
// - The frontier never grows past MAX_FRONTIER entries; extra links are
//   silently dropped, which caps both memory and crawl breadth
// - The result list never grows past the requested maximum
// - Every page is fetched at most once per crawl
//
// Failure policy: a page that fails to fetch contributes nothing and the
// traversal moves on. The crawl as a whole only errors on invalid input.
// =============================================================================

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use super::extract::{extract_image_urls, extract_internal_links, image_extension};

/// Extensions accepted when the caller does not supply their own set.
pub const DEFAULT_IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Hard cap on pending URLs; links discovered beyond this are dropped.
pub const MAX_FRONTIER: usize = 50;

/// Timeout applied to every page fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Some sites serve bots an empty shell, so we identify as a browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

// Crawls a website breadth-first, collecting image URLs
//
// Parameters:
//   start_url: absolute URL to start crawling from
//   max_images: upper bound on the number of image URLs returned
//   allowed_extensions: optional extension filter (lowercase, no leading dot);
//                       None means DEFAULT_IMAGE_EXTENSIONS
//
// Returns: image URLs in discovery order, possibly fewer than max_images
//          when the site runs out of pages first
//
// The only error path is an unparseable start URL. Per-page fetch and parse
// failures are logged and skipped.
pub async fn crawl_images(
    start_url: &str,
    max_images: usize,
    allowed_extensions: Option<HashSet<String>>,
) -> Result<Vec<String>> {
    let start = Url::parse(start_url).map_err(|e| anyhow!("invalid URL '{}': {}", start_url, e))?;
    if !matches!(start.scheme(), "http" | "https") {
        return Err(anyhow!("unsupported scheme '{}'", start.scheme()));
    }

    let allowed: HashSet<String> = match allowed_extensions {
        Some(set) if !set.is_empty() => set.into_iter().map(|e| e.to_ascii_lowercase()).collect(),
        _ => DEFAULT_IMAGE_EXTENSIONS
            .iter()
            .map(|e| e.to_string())
            .collect(),
    };

    let client = Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(BROWSER_USER_AGENT)
        .build()?;

    // All crawl state is local to this invocation; concurrent crawls
    // share nothing
    let mut frontier = VecDeque::from([start.to_string()]);
    let mut visited: HashSet<String> = HashSet::new();
    let mut images: Vec<String> = Vec::new();

    while let Some(page_url) = frontier.pop_front() {
        if images.len() >= max_images {
            break;
        }

        // Duplicates may be enqueued before their first visit; they are
        // filtered here, at dequeue time
        if !visited.insert(page_url.clone()) {
            continue;
        }

        debug!(url = %page_url, "crawling page");

        let html = match fetch_page(&client, &page_url).await {
            Ok(html) => html,
            Err(e) => {
                // No retry, no distinction between unreachable and empty:
                // this page simply contributes nothing
                warn!(url = %page_url, error = %e, "page fetch failed, skipping");
                continue;
            }
        };

        let page = match Url::parse(&page_url) {
            Ok(url) => url,
            Err(_) => continue,
        };

        for image_url in extract_image_urls(&html, &page) {
            if images.len() >= max_images {
                break;
            }
            let keep = image_extension(&image_url)
                .map(|ext| allowed.contains(&ext))
                .unwrap_or(false);
            if keep {
                images.push(image_url);
            }
        }

        for link in extract_internal_links(&html, &page) {
            if frontier.len() >= MAX_FRONTIER {
                break;
            }
            if !visited.contains(&link) {
                frontier.push_back(link);
            }
        }
    }

    Ok(images)
}

// Fetches a web page and returns its HTML content
//
// Non-success status codes are treated the same as transport errors: the
// caller skips the page either way.
async fn fetch_page(client: &Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(anyhow!("HTTP {}", response.status()));
    }

    let html = response.text().await?;
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::Path;
    use axum::response::Html;
    use axum::routing::get;
    use axum::Router;

    // Serves a fixed set of routes on a loopback port and counts every
    // request, so tests can assert on fetch behavior
    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn counting(html: &'static str, hits: Arc<AtomicUsize>) -> Router {
        Router::new().route(
            "/",
            get(move || {
                hits.fetch_add(1, Ordering::SeqCst);
                async move { Html(html) }
            }),
        )
    }

    #[tokio::test]
    async fn test_result_never_exceeds_max_images() {
        let html = r#"
            <img src="/a.png"><img src="/b.jpg"><img src="/c.gif">
            <img src="/d.webp"><img src="/e.jpeg">
        "#;
        let addr = serve(Router::new().route("/", get(move || async move { Html(html) }))).await;

        let images = crawl_images(&format!("http://{addr}/"), 3, None)
            .await
            .unwrap();
        assert_eq!(images.len(), 3);
        assert!(images[0].ends_with("/a.png"));
    }

    #[tokio::test]
    async fn test_empty_page_is_one_fetch_and_no_results() {
        let hits = Arc::new(AtomicUsize::new(0));
        let addr = serve(counting("<html><body>nothing here</body></html>", hits.clone())).await;

        let images = crawl_images(&format!("http://{addr}/"), 10, None)
            .await
            .unwrap();
        assert!(images.is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreachable_start_returns_empty_not_error() {
        // Nothing listens on port 1; the connection is refused immediately
        let images = crawl_images("http://127.0.0.1:1/", 5, None).await.unwrap();
        assert!(images.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_start_url_is_an_error() {
        assert!(crawl_images("not a url", 5, None).await.is_err());
        assert!(crawl_images("ftp://example.com/", 5, None).await.is_err());
    }

    #[tokio::test]
    async fn test_breadth_first_follows_links_for_more_images() {
        let addr = serve(
            Router::new()
                .route(
                    "/",
                    get(|| async { Html(r#"<img src="/one.png"><a href="/next">next</a>"#) }),
                )
                .route("/next", get(|| async { Html(r#"<img src="/two.png">"#) })),
        )
        .await;

        let images = crawl_images(&format!("http://{addr}/"), 2, None)
            .await
            .unwrap();
        assert_eq!(
            images,
            vec![
                format!("http://{addr}/one.png"),
                format!("http://{addr}/two.png"),
            ]
        );
    }

    #[tokio::test]
    async fn test_mutually_linking_pages_fetched_once_each() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_a = hits.clone();
        let hits_b = hits.clone();
        let addr = serve(
            Router::new()
                .route(
                    "/",
                    get(move || {
                        hits_a.fetch_add(1, Ordering::SeqCst);
                        async { Html(r#"<a href="/b">b</a>"#) }
                    }),
                )
                .route(
                    "/b",
                    get(move || {
                        hits_b.fetch_add(1, Ordering::SeqCst);
                        async { Html(r#"<a href="/">back</a>"#) }
                    }),
                ),
        )
        .await;

        let images = crawl_images(&format!("http://{addr}/"), 5, None)
            .await
            .unwrap();
        assert!(images.is_empty());
        // Two pages, each visited exactly once despite linking to each other
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_frontier_is_bounded_at_fifty() {
        // A hub page linking to 100 children; only 50 fit in the frontier,
        // so the crawl makes exactly 1 + 50 fetches
        let hub: String = (0..100)
            .map(|i| format!(r#"<a href="/page/{i}">p{i}</a>"#))
            .collect();
        let hub: &'static str = Box::leak(hub.into_boxed_str());
        let hits = Arc::new(AtomicUsize::new(0));
        let hub_hits = hits.clone();
        let child_hits = hits.clone();

        let addr = serve(
            Router::new()
                .route(
                    "/",
                    get(move || {
                        hub_hits.fetch_add(1, Ordering::SeqCst);
                        async move { Html(hub) }
                    }),
                )
                .route(
                    "/page/:id",
                    get(move |Path(_id): Path<u32>| {
                        child_hits.fetch_add(1, Ordering::SeqCst);
                        async { Html("<html><body>leaf</body></html>") }
                    }),
                ),
        )
        .await;

        let images = crawl_images(&format!("http://{addr}/"), 100, None)
            .await
            .unwrap();
        assert!(images.is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 1 + MAX_FRONTIER);
    }

    #[tokio::test]
    async fn test_custom_extension_filter() {
        let html = r#"<img src="/a.png"><img src="/b.svg"><img src="/c.png">"#;
        let addr = serve(Router::new().route("/", get(move || async move { Html(html) }))).await;

        let only_svg: HashSet<String> = ["svg".to_string()].into_iter().collect();
        let images = crawl_images(&format!("http://{addr}/"), 10, Some(only_svg))
            .await
            .unwrap();
        assert_eq!(images, vec![format!("http://{addr}/b.svg")]);
    }

    #[tokio::test]
    async fn test_returned_extensions_are_all_allowed() {
        let html = r#"
            <img src="/a.PNG?width=10"><img src="/b.tiff">
            <img src="/c.jpeg"><img src="/noext">
        "#;
        let addr = serve(Router::new().route("/", get(move || async move { Html(html) }))).await;

        let images = crawl_images(&format!("http://{addr}/"), 10, None)
            .await
            .unwrap();
        assert_eq!(images.len(), 2);
        for url in &images {
            let ext = image_extension(url).unwrap();
            assert!(DEFAULT_IMAGE_EXTENSIONS.contains(&ext.as_str()));
        }
    }
}
