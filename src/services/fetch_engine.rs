//! Fetch Engine for OmniDownloader.
//!
//! Retrieves a URL's bytes through an ordered chain of access strategies
//! (direct first, then a relay that rewrites the URL), streaming progress
//! events while the body arrives.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::services::naming::VIDEO_MIME_TYPE;
use crate::types::errors::FetchError;
use crate::types::settings::FetchSettings;

/// Bytes per synthetic progress percent when no length is declared (50 KiB).
pub const BYTES_PER_ESTIMATED_PERCENT: u64 = 50 * 1024;
/// Progress reported while a strategy is connecting.
pub const CONNECTING_PERCENT: u8 = 5;

/// One way of reaching a URL's bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessStrategy {
    Direct,
    /// Relay that receives the percent-encoded target appended to `prefix`.
    Proxy { name: String, prefix: String },
}

impl AccessStrategy {
    pub fn name(&self) -> &str {
        match self {
            AccessStrategy::Direct => "direct",
            AccessStrategy::Proxy { name, .. } => name,
        }
    }

    /// Rewrites `url` into the address this strategy requests.
    pub fn rewrite(&self, url: &str) -> String {
        match self {
            AccessStrategy::Direct => url.to_string(),
            AccessStrategy::Proxy { prefix, .. } => {
                format!("{}{}", prefix, urlencoding::encode(url))
            }
        }
    }
}

/// Phase of a fetch reported to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Connecting,
    Downloading,
    Finished,
}

/// Incremental progress of one fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchProgress {
    pub phase: FetchPhase,
    pub strategy: String,
    pub percent: u8,
    pub received_bytes: u64,
    pub total_bytes: Option<u64>,
}

impl FetchProgress {
    /// Human-readable received size, e.g. `"1.5 MB"`.
    pub fn size_label(&self) -> String {
        format!("{:.1} MB", self.received_bytes as f64 / 1024.0 / 1024.0)
    }

    pub fn status_label(&self) -> String {
        match self.phase {
            FetchPhase::Connecting => format!("connecting ({})...", self.strategy),
            FetchPhase::Downloading => "downloading...".to_string(),
            FetchPhase::Finished => "completed".to_string(),
        }
    }
}

/// Computes progress percentages from received byte counts.
///
/// With a declared length: `floor(received / total * 100)`, capped at 100.
/// Without one: one percent per 50 KiB, capped at 99 so completion is never
/// claimed before the stream ends.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: Option<u64>,
    received: u64,
}

impl ProgressTracker {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|t| *t > 0),
            received: 0,
        }
    }

    /// Records a received chunk and returns the updated percentage.
    pub fn record(&mut self, chunk_len: usize) -> u8 {
        self.received += chunk_len as u64;
        self.percent()
    }

    pub fn percent(&self) -> u8 {
        match self.total {
            Some(total) => (self.received.saturating_mul(100) / total).min(100) as u8,
            None => (self.received / BYTES_PER_ESTIMATED_PERCENT).min(99) as u8,
        }
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }
}

/// Bytes materialised from a completed fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedMedia {
    pub bytes: Vec<u8>,
    /// Content type label; forced to QuickTime for video fetches.
    pub content_type: Option<String>,
}

/// Trait defining URL retrieval.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        is_video: bool,
        progress: &mut (dyn FnMut(FetchProgress) + Send),
    ) -> Result<FetchedMedia, FetchError>;
}

/// reqwest-backed fetcher with an ordered strategy chain.
pub struct FetchEngine {
    client: reqwest::Client,
    strategies: Vec<AccessStrategy>,
}

impl FetchEngine {
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;

        let mut strategies = vec![AccessStrategy::Direct];
        if settings.proxy_enabled && !settings.proxy_prefix.trim().is_empty() {
            strategies.push(AccessStrategy::Proxy {
                name: "proxy".to_string(),
                prefix: settings.proxy_prefix.clone(),
            });
        }

        Ok(Self { client, strategies })
    }

    /// Replaces the strategy chain. An empty chain falls back to direct only.
    pub fn with_strategies(mut self, strategies: Vec<AccessStrategy>) -> Self {
        self.strategies = if strategies.is_empty() {
            vec![AccessStrategy::Direct]
        } else {
            strategies
        };
        self
    }

    pub fn strategies(&self) -> &[AccessStrategy] {
        &self.strategies
    }

    async fn fetch_via(
        &self,
        strategy: &AccessStrategy,
        url: &str,
        is_video: bool,
        progress: &mut (dyn FnMut(FetchProgress) + Send),
    ) -> Result<FetchedMedia, FetchError> {
        let target = strategy.rewrite(url);
        let response = self
            .client
            .get(&target)
            .send()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut tracker = ProgressTracker::new(response.content_length());
        let mut bytes = Vec::with_capacity(tracker.total().unwrap_or(0).min(64 * 1024 * 1024) as usize);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::StreamError(e.to_string()))?;
            bytes.extend_from_slice(&chunk);
            let percent = tracker.record(chunk.len());
            progress(FetchProgress {
                phase: FetchPhase::Downloading,
                strategy: strategy.name().to_string(),
                percent,
                received_bytes: tracker.received(),
                total_bytes: tracker.total(),
            });
        }

        progress(FetchProgress {
            phase: FetchPhase::Finished,
            strategy: strategy.name().to_string(),
            percent: 100,
            received_bytes: tracker.received(),
            total_bytes: tracker.total(),
        });

        let content_type = if is_video {
            Some(VIDEO_MIME_TYPE.to_string())
        } else {
            content_type
        };

        Ok(FetchedMedia {
            bytes,
            content_type,
        })
    }
}

#[async_trait]
impl Fetcher for FetchEngine {
    async fn fetch(
        &self,
        url: &str,
        is_video: bool,
        progress: &mut (dyn FnMut(FetchProgress) + Send),
    ) -> Result<FetchedMedia, FetchError> {
        let mut last_error: Option<FetchError> = None;

        for strategy in &self.strategies {
            progress(FetchProgress {
                phase: FetchPhase::Connecting,
                strategy: strategy.name().to_string(),
                percent: CONNECTING_PERCENT,
                received_bytes: 0,
                total_bytes: None,
            });

            match self.fetch_via(strategy, url, is_video, progress).await {
                Ok(media) => {
                    debug!(strategy = strategy.name(), url, bytes = media.bytes.len(), "fetch succeeded");
                    return Ok(media);
                }
                Err(err) => {
                    warn!(strategy = strategy.name(), url, error = %err, "access strategy failed");
                    last_error = Some(err);
                }
            }
        }

        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "fetch failed".to_string());
        Err(FetchError::AllStrategiesFailed(message))
    }
}
