// src/download/mod.rs
// =============================================================================
// This module brings remote images into local storage.
//
// Submodules:
// - fetch: concurrent batch download with per-item failure tolerance
// - archive: zip packing for the bundle endpoint
// =============================================================================

mod archive;
mod fetch;

pub use archive::zip_directory;
pub use fetch::{download_all, public_url};
