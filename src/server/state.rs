// src/server/state.rs
// =============================================================================
// Shared application state, cloned into every handler.
//
// The visit counter and the session-token store are deliberately plain
// struct fields here rather than globals: each one is created in main,
// lives exactly as long as the server, and reaches handlers only through
// this state.
// =============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use dashmap::DashMap;
use reqwest::Client;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::cli::Config;
use crate::crawl::BROWSER_USER_AGENT;
use crate::generate::ImageGenClient;

/// Timeout for outbound download and robots requests.
const OUTBOUND_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

#[derive(Clone)]
pub struct AppState {
    /// Outbound client for downloads and robots checks
    pub http: Client,
    pub config: Arc<Config>,
    /// Present only when an API key was configured
    pub generator: Option<Arc<ImageGenClient>>,
    pub visits: Arc<VisitCounter>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(OUTBOUND_TIMEOUT)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .context("failed to build outbound HTTP client")?;

        let generator = match &config.together_api_key {
            Some(key) => Some(Arc::new(ImageGenClient::new(
                &config.together_base_url,
                key,
                &config.generate_model,
            )?)),
            None => None,
        };

        let visits = Arc::new(VisitCounter::load(config.visits_file.clone()).await);

        Ok(Self {
            http,
            config: Arc::new(config),
            generator,
            visits,
            sessions: Arc::new(SessionStore::new()),
        })
    }
}

/// Monotonic visit counter persisted to a small text file.
///
/// The count lives behind an async mutex so the read-modify-write against
/// the backing file is a single critical section.
pub struct VisitCounter {
    path: PathBuf,
    count: Mutex<u64>,
}

impl VisitCounter {
    // Seeds the counter from the backing file; a missing or garbled file
    // starts the count at zero
    pub async fn load(path: PathBuf) -> Self {
        let count = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents.trim().parse().unwrap_or(0),
            Err(_) => 0,
        };

        Self {
            path,
            count: Mutex::new(count),
        }
    }

    // Bumps the counter and persists the new value
    //
    // Returns: the incremented count
    pub async fn increment(&self) -> Result<u64> {
        let mut count = self.count.lock().await;
        *count += 1;
        tokio::fs::write(&self.path, count.to_string())
            .await
            .with_context(|| format!("failed to persist visit count to {}", self.path.display()))?;
        Ok(*count)
    }
}

/// Maps bundle tokens to session ids for later cleanup.
///
/// DashMap keeps this safe under concurrent handlers without an outer lock.
pub struct SessionStore {
    tokens: DashMap<String, String>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            tokens: DashMap::new(),
        }
    }

    // Creates a fresh session and returns its token
    pub fn create(&self) -> String {
        let session_id = Uuid::new_v4().simple().to_string();
        self.tokens.insert(session_id.clone(), session_id.clone());
        session_id
    }

    // Looks up the session id behind a token
    pub fn validate(&self, token: &str) -> Option<String> {
        self.tokens.get(token).map(|entry| entry.value().clone())
    }

    // Forgets a token; validating it afterwards fails
    pub fn invalidate(&self, token: &str) {
        self.tokens.remove(token);
    }
}
