// src/download/fetch.rs
// =============================================================================
// This module downloads batches of remote images into local storage.
//
// Key behavior:
// - Every URL in a batch is fetched independently; one failure never
//   affects the others
// - Failed items (non-200 response or transport error) are simply left
//   out of the result - omission is the only failure signal
// - Saved files get a short random name with a fixed image extension so
//   concurrent batches can never collide
//
// Concurrency: a bounded fan-out via futures' buffer_unordered. Downloads
// complete in whatever order the network dictates, so the result order is
// not guaranteed to match the input order.
// =============================================================================

use std::path::Path;

use futures::stream::{self, StreamExt}; // StreamExt gives us .buffer_unordered()
use reqwest::{Client, StatusCode};
use tracing::warn;
use url::Url;
use uuid::Uuid;

/// How many downloads are in flight at once per batch.
pub const DOWNLOAD_CONCURRENCY: usize = 8;

/// Every saved file gets this extension, whatever the source served.
const SAVED_IMAGE_EXT: &str = "png";

// Downloads every URL in the batch, writing successes into `dir`
//
// Parameters:
//   client: shared HTTP client (cheap to clone, pools connections)
//   urls: remote image URLs to fetch
//   dir: existing directory the files are written into
//
// Returns: filenames (not full paths) of the successfully saved images,
//          in completion order
pub async fn download_all(client: &Client, urls: Vec<String>, dir: &Path) -> Vec<String> {
    let downloads = urls.into_iter().map(|url| {
        let client = client.clone();
        async move { save_image(&client, &url, dir).await }
    });

    stream::iter(downloads)
        .buffer_unordered(DOWNLOAD_CONCURRENCY)
        // Failures resolved to None inside save_image; drop them here
        .filter_map(|saved| async move { saved })
        .collect()
        .await
}

// Downloads a single image to a uniquely named file
//
// Returns: Some(filename) on success, None on any failure. The failure is
// logged but deliberately not propagated - a batch tolerates missing items.
async fn save_image(client: &Client, url: &str, dir: &Path) -> Option<String> {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(url = %url, error = %e, "image download failed");
            return None;
        }
    };

    if response.status() != StatusCode::OK {
        warn!(url = %url, status = %response.status(), "image download rejected");
        return None;
    }

    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(url = %url, error = %e, "image body read failed");
            return None;
        }
    };

    let filename = random_filename();
    let path = dir.join(&filename);

    match tokio::fs::write(&path, &bytes).await {
        Ok(()) => Some(filename),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "image write failed");
            None
        }
    }
}

// Short random identifier plus a fixed extension, e.g. "3fa9c1.png".
// Six hex characters are plenty for files that live five minutes.
fn random_filename() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}.{}", &id[..6], SAVED_IMAGE_EXT)
}

// Builds the externally visible URL for a stored file
//
// Parameters:
//   base_url: the deployment's public base URL, e.g. "https://api.example.com"
//   mount: the route the storage directory is served under, e.g. "temp"
//   filename: a name returned by download_all
//
// Returns: None only when the base URL itself does not parse
pub fn public_url(base_url: &str, mount: &str, filename: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    base.join(&format!("{}/{}", mount.trim_matches('/'), filename))
        .ok()
        .map(|url| url.to_string())
}
