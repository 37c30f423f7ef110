//! REST client for the realtime store
//!
//! ## Overview
//!
//! The store exposes every node as JSON at `{base}/{path}.json`. A full dump
//! can run to tens of megabytes, so two helpers keep fetches small:
//!
//! - `?shallow=true` returns only the child keys of a node (values become
//!   `true`), which is enough to list devices or sensors
//! - fetching a subtree (`Device_1/BME_01`) returns just that sensor's data
//!
//! Requests run on tokio's blocking pool; transient failures (transport
//! errors, 5xx, 429) are retried with exponential backoff.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use knose_connectors::http::{RtdbConfig, RtdbConnector};
//! use knose_connectors::StoreSource;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RtdbConfig::new("https://knose-default-rtdb.example.com")
//!     .timeout_secs(180)
//!     .max_retries(2);
//! let store = RtdbConnector::new(config)?;
//!
//! let devices = store.fetch_keys("").await?;
//! let readings = store.fetch_readings(&format!("{}/BME_01", devices[0])).await?;
//! println!("{} readings", readings.len());
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use knose_core::Reading;
use knose_schemas::tree::flatten_subtree;
use serde_json::Value;
use thiserror::Error;

use crate::{path_segments, ConnectorError, StoreSource};

/// HTTP-specific errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(String),

    /// Server returned error status
    #[error("Server error {status}: {message}")]
    ServerError {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Response body was not JSON
    #[error("Invalid response body: {0}")]
    Body(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Connection settings
#[derive(Debug, Clone)]
pub struct RtdbConfig {
    /// Database root URL, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry
    pub backoff: Duration,
    /// Database auth token, sent as the `auth` query parameter
    pub auth_token: Option<String>,
    /// User agent string
    pub user_agent: String,
}

impl RtdbConfig {
    /// Configuration for the database at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(120),
            max_retries: 3,
            backoff: Duration::from_millis(200),
            auth_token: None,
            user_agent: format!("knose/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Set the retry count
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the initial retry delay in milliseconds
    pub fn backoff_millis(mut self, millis: u64) -> Self {
        self.backoff = Duration::from_millis(millis);
        self
    }

    /// Authenticate requests with a database token
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1 << attempt.saturating_sub(1).min(16))
    }
}

/// Request counters
#[derive(Debug, Default, Clone)]
pub struct ConnectionStats {
    /// Requests that returned a body
    pub requests_succeeded: u64,
    /// Requests that failed after all retries
    pub requests_failed: u64,
    /// Retry attempts made
    pub retries: u64,
    /// Response bytes received
    pub bytes_received: u64,
    /// Last error message
    pub last_error: Option<String>,
}

/// Realtime-store REST client
pub struct RtdbConnector {
    config: RtdbConfig,
    agent: ureq::Agent,
    stats: Arc<Mutex<ConnectionStats>>,
}

impl RtdbConnector {
    /// Create a client
    pub fn new(config: RtdbConfig) -> Result<Self, HttpError> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(HttpError::Config("Base URL must start with http:// or https://".into()));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();

        Ok(Self {
            config,
            agent,
            stats: Arc::new(Mutex::new(ConnectionStats::default())),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &RtdbConfig {
        &self.config
    }

    /// Snapshot of the request counters
    pub fn stats(&self) -> ConnectionStats {
        self.lock_stats().clone()
    }

    /// GET request for the JSON document at `path`
    ///
    /// Query parameters are percent-encoded by ureq.
    pub fn request_for(&self, path: &str, shallow: bool) -> ureq::Request {
        let url = format!("{}/{}.json", self.config.base_url, path_segments(path).join("/"));
        let mut request = self.agent.get(&url);
        if shallow {
            request = request.query("shallow", "true");
        }
        if let Some(token) = &self.config.auth_token {
            request = request.query("auth", token);
        }
        request
    }

    /// URL of the JSON document at `path`
    pub fn url_for(&self, path: &str, shallow: bool) -> String {
        self.request_for(path, shallow).url().to_string()
    }

    /// JSON document at `path`
    pub async fn get(&self, path: &str, shallow: bool) -> Result<Value, HttpError> {
        self.execute_with_retry(self.request_for(path, shallow)).await
    }

    /// Child keys of the node at `path`
    pub async fn fetch_keys(&self, path: &str) -> Result<Vec<String>, HttpError> {
        match self.get(path, true).await? {
            Value::Object(children) => Ok(children.keys().cloned().collect()),
            Value::Null => Ok(Vec::new()),
            _ => Err(HttpError::Body(format!("{:?} is not an object node", path))),
        }
    }

    async fn execute_with_retry(&self, request: ureq::Request) -> Result<Value, HttpError> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = self.config.retry_delay(attempt);
                log::warn!("Retrying store request in {:?} (attempt {})", delay, attempt + 1);
                self.lock_stats().retries += 1;
                tokio::time::sleep(delay).await;
            }

            let request = request.clone();
            let response = tokio::task::spawn_blocking(move || request.call())
                .await
                .map_err(|e| HttpError::Request(e.to_string()))?;

            match response {
                Ok(resp) => {
                    let text = resp.into_string().map_err(|e| HttpError::Request(e.to_string()))?;
                    {
                        let mut stats = self.lock_stats();
                        stats.requests_succeeded += 1;
                        stats.bytes_received += text.len() as u64;
                    }
                    if text.is_empty() {
                        return Ok(Value::Null);
                    }
                    return serde_json::from_str(&text).map_err(|e| HttpError::Body(e.to_string()));
                }
                Err(ureq::Error::Status(code, resp)) => {
                    let error = HttpError::ServerError {
                        status: code,
                        message: resp.into_string().unwrap_or_default(),
                    };
                    if code >= 500 || code == 429 {
                        last_error = Some(error);
                        continue;
                    }
                    return Err(self.record_failure(error));
                }
                Err(ureq::Error::Transport(e)) => {
                    last_error = Some(HttpError::Request(e.to_string()));
                }
            }
        }

        let error = last_error.unwrap_or_else(|| HttpError::Request("Unknown error".into()));
        Err(self.record_failure(error))
    }

    fn record_failure(&self, error: HttpError) -> HttpError {
        let mut stats = self.lock_stats();
        stats.requests_failed += 1;
        stats.last_error = Some(error.to_string());
        error
    }

    fn lock_stats(&self) -> MutexGuard<'_, ConnectionStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl StoreSource for RtdbConnector {
    async fn fetch(&self, path: &str) -> Result<Value, ConnectorError> {
        Ok(self.get(path, false).await?)
    }

    async fn fetch_readings(&self, path: &str) -> Result<Vec<Reading>, ConnectorError> {
        let tree = self.get(path, false).await?;
        let readings = flatten_subtree(&tree, &path_segments(path))?;
        log::debug!("{} readings under {:?}", readings.len(), path);
        Ok(readings)
    }
}
