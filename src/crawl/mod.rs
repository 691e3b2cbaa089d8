// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling for images.
//
// Submodules:
// - spider: breadth-first traversal with a bounded frontier (the core)
// - extract: pulls image sources and same-origin links out of HTML
// - robots: blanket robots.txt check, consulted only behind a config flag
//
// This file (mod.rs) is the module root - it ties everything together and
// exports the public API that other parts of our application can use.
// =============================================================================

mod extract;
mod robots;
mod spider;

// Re-export public items from submodules
// This lets callers write `crawl::crawl_images()` instead of
// `crawl::spider::crawl_images()`
pub use robots::is_crawl_allowed;
pub use spider::{crawl_images, BROWSER_USER_AGENT};
