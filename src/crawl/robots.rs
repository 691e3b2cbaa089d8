// src/crawl/robots.rs
// =============================================================================
// This module answers one question: does a site's robots.txt forbid
// crawling outright?
//
// Only the blanket directive is honored - a line reading exactly
// "Disallow: /". Path-scoped rules, user-agent groups and crawl delays are
// not interpreted. When robots.txt is unreachable or unparseable we assume
// crawling is allowed, matching how a missing file is treated in practice.
// =============================================================================

use std::time::Duration;

use reqwest::Client;
use tracing::debug;
use url::Url;

const ROBOTS_TIMEOUT: Duration = Duration::from_secs(5);

// Checks whether a site blanket-disallows crawling
//
// Parameters:
//   client: shared HTTP client for the robots.txt fetch
//   url: any URL on the site; only its scheme + host are used
//
// Returns: false only when robots.txt was fetched and contains a blanket
//          "Disallow: /" line; true in every other case
pub async fn is_crawl_allowed(client: &Client, url: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(url) => url,
        Err(_) => return true,
    };

    // Keeps scheme, host and port, replaces the path
    let robots_url = match parsed.join("/robots.txt") {
        Ok(url) => url.to_string(),
        Err(_) => return true,
    };

    let body = match fetch_robots(client, &robots_url).await {
        Some(body) => body,
        None => {
            debug!(url = %robots_url, "robots.txt unreachable, assuming allowed");
            return true;
        }
    };

    !has_blanket_disallow(&body)
}

async fn fetch_robots(client: &Client, robots_url: &str) -> Option<String> {
    let response = client
        .get(robots_url)
        .timeout(ROBOTS_TIMEOUT)
        .send()
        .await
        .ok()?;

    if !response.status().is_success() {
        return None;
    }

    response.text().await.ok()
}

// A blanket disallow is a line that is exactly "Disallow: /" once trimmed.
// A substring check would wrongly match "Disallow: /private".
fn has_blanket_disallow(robots: &str) -> bool {
    robots.lines().any(|line| line.trim() == "Disallow: /")
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::routing::get;
    use axum::Router;

    async fn serve(router: Router) -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    #[test]
    fn test_blanket_disallow_detected() {
        assert!(has_blanket_disallow("User-agent: *\nDisallow: /\n"));
        assert!(has_blanket_disallow("  Disallow: /  "));
    }

    #[test]
    fn test_path_scoped_disallow_is_not_blanket() {
        assert!(!has_blanket_disallow("User-agent: *\nDisallow: /private\n"));
        assert!(!has_blanket_disallow("Allow: /\n"));
    }

    #[tokio::test]
    async fn test_disallowed_site() {
        let addr = serve(Router::new().route(
            "/robots.txt",
            get(|| async { "User-agent: *\nDisallow: /\n" }),
        ))
        .await;

        let client = Client::new();
        assert!(!is_crawl_allowed(&client, &format!("http://{addr}/some/page")).await);
    }

    #[tokio::test]
    async fn test_allowed_site() {
        let addr = serve(Router::new().route(
            "/robots.txt",
            get(|| async { "User-agent: *\nDisallow: /admin\n" }),
        ))
        .await;

        let client = Client::new();
        assert!(is_crawl_allowed(&client, &format!("http://{addr}/")).await);
    }

    #[tokio::test]
    async fn test_unreachable_robots_assumes_allowed() {
        let client = Client::new();
        assert!(is_crawl_allowed(&client, "http://127.0.0.1:1/").await);
    }
}
