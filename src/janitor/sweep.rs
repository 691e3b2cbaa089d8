// src/janitor/sweep.rs
// =============================================================================
// This module is the background cleaner for temporary storage.
//
// Every tick it scans the storage directories and deletes any entry - file
// or directory - whose last modification is older than the TTL. Directories
// go recursively (a bundle's staging folder disappears as one unit).
//
// There is no locking against in-flight writers: a file still being written
// when the sweep runs and already older than the TTL would be deleted. With
// a five-minute window and small batches that race is accepted.
// =============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

// Runs the janitor forever
//
// Parameters:
//   dirs: storage directories to sweep on every tick
//   interval: time between sweeps
//   ttl: maximum entry age
//
// Sweep errors are logged and swallowed; the task itself never exits.
pub async fn run(dirs: Vec<PathBuf>, interval: Duration, ttl: Duration) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick fires immediately; skip it so a fresh start does not
    // sweep before anything exists
    ticker.tick().await;

    loop {
        ticker.tick().await;
        for dir in &dirs {
            match sweep_expired(dir, ttl).await {
                Ok(0) => {}
                Ok(removed) => info!(dir = %dir.display(), removed, "🧹 swept expired entries"),
                Err(e) => warn!(dir = %dir.display(), error = %e, "sweep failed"),
            }
        }
    }
}

// Removes every entry in `dir` older than `ttl`
//
// Returns: how many entries were removed. A missing directory counts as
// an error; per-entry metadata or delete failures only skip that entry.
pub async fn sweep_expired(dir: &Path, ttl: Duration) -> Result<usize> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("failed to read {}", dir.display()))?;

    let mut removed = 0;

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();

        if !is_expired(&path, ttl).await {
            continue;
        }

        let result = if path.is_dir() {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };

        match result {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove entry"),
        }
    }

    Ok(removed)
}

// An entry is expired when its mtime is further in the past than the TTL.
// Unreadable metadata or a clock-skewed future mtime both count as fresh,
// so nothing is deleted on bad information.
async fn is_expired(path: &Path, ttl: Duration) -> bool {
    let modified = match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(_) => return false,
    };

    modified.elapsed().map(|age| age > ttl).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[tokio::test]
    async fn test_old_entry_removed_new_entry_kept() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("old.png");
        std::fs::write(&old, b"old").unwrap();

        // Let the first file age past the TTL, then create the second
        tokio::time::sleep(Duration::from_millis(1200)).await;
        let fresh = dir.path().join("fresh.png");
        std::fs::write(&fresh, b"fresh").unwrap();

        let removed = sweep_expired(dir.path(), Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert!(!old.exists());
        assert!(fresh.exists());
    }

    #[tokio::test]
    async fn test_directories_removed_recursively() {
        let dir = TempDir::new().unwrap();
        let staging = dir.path().join("session");
        std::fs::create_dir(&staging).unwrap();
        std::fs::write(staging.join("img.png"), b"data").unwrap();

        // Zero TTL: everything currently in the directory is expired
        let removed = sweep_expired(dir.path(), Duration::ZERO).await.unwrap();

        assert_eq!(removed, 1);
        assert!(!staging.exists());
    }

    #[tokio::test]
    async fn test_nothing_expired_means_nothing_removed() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("keep.png"), b"data").unwrap();

        let removed = sweep_expired(dir.path(), Duration::from_secs(3600))
            .await
            .unwrap();

        assert_eq!(removed, 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("nope");
        assert!(sweep_expired(&gone, Duration::ZERO).await.is_err());
    }
}
