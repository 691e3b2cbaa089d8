// src/generate/mod.rs
// =============================================================================
// This module talks to the third-party image generation API.
// =============================================================================

mod together;

pub use together::ImageGenClient;
