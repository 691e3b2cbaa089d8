// src/generate/together.rs
// =============================================================================
// This module is a thin client for a Together-style image generation API.
//
// One request produces one image URL. Batch generation fans out a fixed
// number of workers and keeps every per-image outcome - a failed image
// never cancels its siblings (the caller decides what an all-failed batch
// means).
//
// Generation is the one outbound call with a longer timeout: synthesis
// routinely takes tens of seconds, unlike page fetches.
// =============================================================================

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Concurrent generation requests per batch.
const GENERATE_WORKERS: usize = 5;

/// Image synthesis is slow; 5 seconds would time out every request.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed diffusion parameters the original service shipped with.
const GENERATE_STEPS: u32 = 12;
const GENERATE_SIZE: u32 = 512;

#[derive(Serialize)]
struct GenerationRequest<'a> {
    prompt: &'a str,
    negative_prompt: &'a str,
    model: &'a str,
    steps: u32,
    seed: u64,
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Deserialize)]
struct GeneratedImage {
    url: String,
}

/// Client for the image generation endpoint, shared across requests.
pub struct ImageGenClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ImageGenClient {
    // Builds the client once at startup
    //
    // Parameters:
    //   base_url: API root, e.g. "https://api.together.xyz"
    //   api_key: bearer token for the API
    //   model: model identifier sent with every request
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(GENERATE_TIMEOUT)
            .build()
            .context("failed to build generation HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    // Generates a single image and returns its hosted URL
    //
    // Parameters:
    //   prompt: text description of the desired image
    //   seed: diffusion seed; different seeds give different images for
    //         the same prompt
    pub async fn generate_one(&self, prompt: &str, seed: u64) -> Result<String> {
        let body = GenerationRequest {
            prompt,
            negative_prompt: "",
            model: &self.model,
            steps: GENERATE_STEPS,
            seed,
            width: GENERATE_SIZE,
            height: GENERATE_SIZE,
        };

        let response = self
            .http
            .post(format!("{}/v1/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("generation request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("generation API returned HTTP {}", status));
        }

        let parsed: GenerationResponse = response
            .json()
            .await
            .context("generation response was not valid JSON")?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|image| image.url)
            .ok_or_else(|| anyhow!("generation response had no data"))
    }

    // Generates `count` images for one prompt, each with a fresh random seed
    //
    // Returns: one Result per requested image, in completion order. Failures
    // are individual outcomes; a batch is never short-circuited.
    pub async fn generate_batch(&self, prompt: &str, count: usize) -> Vec<Result<String>> {
        let jobs = (0..count).map(|_| {
            let seed = rand::rng().random_range(0..1_000_000);
            async move {
                let outcome = self.generate_one(prompt, seed).await;
                if let Err(e) = &outcome {
                    warn!(error = %e, "image generation attempt failed");
                }
                outcome
            }
        });

        stream::iter(jobs)
            .buffer_unordered(GENERATE_WORKERS)
            .collect()
            .await
    }
}
