//! Realtime-store connectors for knose
//!
//! ## Overview
//!
//! Readings reach the classifier in two ways:
//!
//! - **Pull**: fetch a subtree of the realtime store and classify it as a
//!   batch. [`StoreSource`] abstracts where the tree comes from; the REST
//!   client in [`http`] (feature `http`) and the in-memory [`MemorySource`]
//!   both implement it.
//! - **Push**: the store notifies on every write. [`subscription`] owns one
//!   classifier in a single task and applies notifications strictly one at a
//!   time, so tracker state never sees interleaved updates.
//!
//! ## Store Paths
//!
//! Paths are slash-separated keys from the store root, e.g.
//! `Device_1/BME_01`. Leading and trailing slashes are ignored.
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use knose_connectors::{classify_from, MemorySource};
//! use knose_core::{BatchClassifier, ProfileRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = MemorySource::new(serde_json::json!({
//!     "Device_1": { "BME_01": { "Hp_301": {
//!         "2026-02-02_09-38-35_000000000": { "gas_resistance": 10342.5 }
//!     } } }
//! }));
//!
//! let registry = Arc::new(ProfileRegistry::with_default_catalog()?);
//! let mut classifier = BatchClassifier::new(registry);
//! let output = classify_from(&source, "Device_1/BME_01", &mut classifier).await?;
//! assert_eq!(output.records[0].step, 1);
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "http")]
pub mod http;
pub mod subscription;

#[cfg(feature = "http")]
pub use http::{ConnectionStats, HttpError, RtdbConfig, RtdbConnector};
pub use subscription::{FeedOutput, FeedSender, FeedSummary, Notification, SubscriptionFeed};

use knose_core::{BatchClassifier, BatchOutput, Reading};
use knose_schemas::tree::flatten_subtree;
use knose_schemas::SchemaError;
use serde_json::Value;
use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The subscription task has stopped
    #[error("Subscription feed closed")]
    FeedClosed,

    /// Store data did not have the expected layout
    #[error("Store data error: {0}")]
    Schema(#[from] SchemaError),

    /// REST transport failed
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),
}

/// Split a store path into its keys
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

/// Anything that can hand out subtrees of the realtime store
#[async_trait::async_trait]
pub trait StoreSource: Send + Sync {
    /// JSON subtree at `path`, `Value::Null` when nothing is stored there
    async fn fetch(&self, path: &str) -> Result<Value, ConnectorError>;

    /// Readings under `path`
    async fn fetch_readings(&self, path: &str) -> Result<Vec<Reading>, ConnectorError> {
        let tree = self.fetch(path).await?;
        Ok(flatten_subtree(&tree, &path_segments(path))?)
    }
}

/// Store tree held in memory, e.g. a saved dump
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    root: Value,
}

impl MemorySource {
    /// Source serving `root`
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Load a dump file
    pub fn from_json_str(json: &str) -> Result<Self, ConnectorError> {
        let root = serde_json::from_str(json).map_err(SchemaError::from)?;
        Ok(Self { root })
    }
}

#[async_trait::async_trait]
impl StoreSource for MemorySource {
    async fn fetch(&self, path: &str) -> Result<Value, ConnectorError> {
        let node = path_segments(path)
            .into_iter()
            .try_fold(&self.root, |node, key| node.get(key));
        Ok(node.cloned().unwrap_or(Value::Null))
    }
}

/// Fetch everything under `path` and classify it as one batch
pub async fn classify_from<S>(
    source: &S,
    path: &str,
    classifier: &mut BatchClassifier,
) -> Result<BatchOutput, ConnectorError>
where
    S: StoreSource + ?Sized,
{
    let readings = source.fetch_readings(path).await?;
    log::debug!("Fetched {} readings under {:?}", readings.len(), path);
    Ok(classifier.classify_batch(readings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use knose_core::ProfileRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn source() -> MemorySource {
        MemorySource::new(json!({
            "Device_1": {
                "BME_01": { "Hp_301": {
                    "2026-02-02_09-38-35_000000000": { "gas_resistance": 1.0 },
                    "2026-02-02_09-38-42_000000000": { "gas_resistance": 2.0 }
                } },
                "BME_02": { "Hp_301": {
                    "2026-02-02_09-38-36_000000000": { "gas_resistance": 3.0 }
                } }
            }
        }))
    }

    #[test]
    fn splits_paths() {
        assert_eq!(path_segments("/Device_1//BME_01/"), vec!["Device_1", "BME_01"]);
        assert!(path_segments("").is_empty());
    }

    #[tokio::test]
    async fn memory_source_navigates() {
        let source = source();
        assert_eq!(source.fetch_readings("").await.unwrap().len(), 3);
        assert_eq!(source.fetch_readings("/Device_1/BME_02").await.unwrap().len(), 1);
        assert_eq!(source.fetch("Device_9").await.unwrap(), Value::Null);
        assert!(source.fetch_readings("Device_9").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn classifies_a_fetched_subtree() {
        let registry = Arc::new(ProfileRegistry::with_default_catalog().unwrap());
        let mut classifier = BatchClassifier::new(registry);
        let output = classify_from(&source(), "Device_1/BME_01/Hp_301", &mut classifier)
            .await
            .unwrap();
        let steps: Vec<u32> = output.records.iter().map(|r| r.step).collect();
        assert_eq!(steps, vec![1, 3]);
    }

    #[test]
    fn invalid_dump_is_an_error() {
        assert!(matches!(
            MemorySource::from_json_str("{"),
            Err(ConnectorError::Schema(SchemaError::Json(_)))
        ));
    }
}
