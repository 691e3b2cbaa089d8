// src/cli.rs
// =============================================================================
// This file defines the service configuration using the `clap` crate.
//
// Every option is a long flag that doubles as an environment variable, so
// the binary works both from a shell and from a container manifest. The
// defaults are tuned for local development.
// =============================================================================

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "snapcrawl",
    version,
    about = "Backend service that crawls websites for images, generates images from prompts, and serves temporary downloads"
)]
pub struct Config {
    /// Address to bind the HTTP server to (host:port)
    #[arg(long, env = "SNAPCRAWL_BIND", default_value = "127.0.0.1:8000")]
    pub bind: String,

    /// Externally visible base URL used when building links to stored files.
    /// Falls back to the request's Host header when unset.
    #[arg(long, env = "SNAPCRAWL_PUBLIC_BASE_URL")]
    pub public_base_url: Option<String>,

    /// Directory downloaded images are written to (served under /temp)
    #[arg(long, env = "SNAPCRAWL_TEMP_DIR", default_value = "temp")]
    pub temp_dir: PathBuf,

    /// Directory zip bundles are written to (served under /zips)
    #[arg(long, env = "SNAPCRAWL_ZIP_DIR", default_value = "temp_zips")]
    pub zip_dir: PathBuf,

    /// File the visit counter persists to
    #[arg(long, env = "SNAPCRAWL_VISITS_FILE", default_value = "visits.txt")]
    pub visits_file: PathBuf,

    /// API key for the image generation service. Generation requests fail
    /// with a client error when this is unset.
    #[arg(long, env = "TOGETHER_API_KEY")]
    pub together_api_key: Option<String>,

    /// Base URL of the image generation API
    #[arg(
        long,
        env = "SNAPCRAWL_TOGETHER_BASE_URL",
        default_value = "https://api.together.xyz"
    )]
    pub together_base_url: String,

    /// Model identifier sent with every generation request
    #[arg(
        long,
        env = "SNAPCRAWL_GENERATE_MODEL",
        default_value = "black-forest-labs/FLUX.1-schnell"
    )]
    pub generate_model: String,

    /// Refuse to scrape sites whose robots.txt blanket-disallows crawling
    #[arg(long, env = "SNAPCRAWL_RESPECT_ROBOTS")]
    pub respect_robots: bool,

    /// Seconds between janitor sweeps of the storage directories
    #[arg(long, env = "SNAPCRAWL_SWEEP_INTERVAL_SECS", default_value_t = 300)]
    pub sweep_interval_secs: u64,

    /// Seconds a stored file may live before a sweep removes it
    #[arg(long, env = "SNAPCRAWL_ENTRY_TTL_SECS", default_value_t = 300)]
    pub entry_ttl_secs: u64,

    /// Origin allowed to call the API from a browser; repeat for several.
    /// When omitted, any origin is allowed.
    #[arg(long = "allow-origin", env = "SNAPCRAWL_ALLOW_ORIGINS", value_delimiter = ',')]
    pub allow_origins: Vec<String>,
}
