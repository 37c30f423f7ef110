//! Serialized live classification
//!
//! The realtime store pushes a notification for every write. Tracker state
//! must see one sensor's readings in order and never two updates at once, so
//! [`SubscriptionFeed`] runs a single task that owns the classifier:
//!
//! ```text
//! listeners ──notify──▶ mpsc ──▶ [ task: BatchClassifier ] ──▶ mpsc ──▶ consumer
//!                                 one notification at a time
//! ```
//!
//! Dropping every [`FeedSender`] (or calling [`SubscriptionFeed::shutdown`])
//! ends the task once the queue drains.

use knose_core::{sort_readings, BatchClassifier, ClassificationEvent, ClassifiedRecord, Reading};
use knose_schemas::tree::flatten_subtree;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{path_segments, ConnectorError};

/// Default queue depth for both channels
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// One change pushed by the store
#[derive(Debug, Clone)]
pub enum Notification {
    /// A single new reading
    Reading(Reading),
    /// Several readings written together, in any order
    Batch(Vec<Reading>),
    /// Raw write event: JSON `data` stored at `path`
    Put {
        /// Store path of the written node
        path: String,
        /// Written subtree
        data: Value,
    },
}

impl Notification {
    fn into_readings(self) -> Result<Vec<Reading>, ConnectorError> {
        let mut readings = match self {
            Notification::Reading(reading) => return Ok(vec![reading]),
            Notification::Batch(readings) => readings,
            Notification::Put { path, data } => flatten_subtree(&data, &path_segments(&path))?,
        };
        sort_readings(&mut readings);
        Ok(readings)
    }
}

/// What the feed publishes
#[derive(Debug, Clone, PartialEq)]
pub enum FeedOutput {
    /// A classified reading
    Record(ClassifiedRecord),
    /// Something the classifier noticed while producing the preceding record
    Event(ClassificationEvent),
}

/// Counters returned when the feed stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    /// Notifications received
    pub notifications: usize,
    /// Notifications that could not be turned into readings
    pub rejected: usize,
    /// Records published
    pub records: usize,
    /// Events published
    pub events: usize,
}

/// Cloneable handle for pushing notifications
#[derive(Debug, Clone)]
pub struct FeedSender {
    inbox: mpsc::Sender<Notification>,
}

impl FeedSender {
    /// Queue a notification, waiting while the queue is full
    pub async fn notify(&self, notification: Notification) -> Result<(), ConnectorError> {
        self.inbox
            .send(notification)
            .await
            .map_err(|_| ConnectorError::FeedClosed)
    }
}

/// Single-task classifier fed by notifications
pub struct SubscriptionFeed {
    sender: FeedSender,
    task: JoinHandle<FeedSummary>,
}

impl SubscriptionFeed {
    /// Start the feed on the current tokio runtime
    ///
    /// Returns the feed and the receiving end of its output channel.
    pub fn spawn(classifier: BatchClassifier, capacity: usize) -> (Self, mpsc::Receiver<FeedOutput>) {
        let capacity = capacity.max(1);
        let (inbox_tx, inbox_rx) = mpsc::channel(capacity);
        let (outbox_tx, outbox_rx) = mpsc::channel(capacity);
        let task = tokio::spawn(run(classifier, inbox_rx, outbox_tx));

        let feed = Self {
            sender: FeedSender { inbox: inbox_tx },
            task,
        };
        (feed, outbox_rx)
    }

    /// Another handle for pushing notifications
    pub fn sender(&self) -> FeedSender {
        self.sender.clone()
    }

    /// Queue a notification
    pub async fn notify(&self, notification: Notification) -> Result<(), ConnectorError> {
        self.sender.notify(notification).await
    }

    /// Stop accepting notifications and wait for the queue to drain
    ///
    /// Senders obtained from [`sender`](Self::sender) keep the task alive
    /// until they are dropped too.
    pub async fn shutdown(self) -> Result<FeedSummary, ConnectorError> {
        drop(self.sender);
        self.task.await.map_err(|_| ConnectorError::FeedClosed)
    }
}

async fn run(
    mut classifier: BatchClassifier,
    mut inbox: mpsc::Receiver<Notification>,
    outbox: mpsc::Sender<FeedOutput>,
) -> FeedSummary {
    let mut summary = FeedSummary::default();

    while let Some(notification) = inbox.recv().await {
        summary.notifications += 1;
        let readings = match notification.into_readings() {
            Ok(readings) => readings,
            Err(e) => {
                log::warn!("Dropping notification: {}", e);
                summary.rejected += 1;
                continue;
            }
        };

        for reading in readings {
            let record = classifier.classify_reading(reading);
            let events = classifier.take_events();
            if outbox.send(FeedOutput::Record(record)).await.is_err() {
                log::debug!("Feed output closed, stopping");
                return summary;
            }
            summary.records += 1;
            for event in events {
                if outbox.send(FeedOutput::Event(event)).await.is_err() {
                    log::debug!("Feed output closed, stopping");
                    return summary;
                }
                summary.events += 1;
            }
        }
    }

    log::debug!(
        "Subscription feed stopped after {} notifications ({} records)",
        summary.notifications,
        summary.records
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use knose_core::{ProfileRegistry, RecordIssue};
    use serde_json::json;
    use std::sync::Arc;

    fn classifier() -> BatchClassifier {
        BatchClassifier::new(Arc::new(ProfileRegistry::with_default_catalog().unwrap()))
    }

    fn reading(key: &str) -> Reading {
        Reading::new("Device_1", "BME_01", "Hp_301", key)
    }

    #[tokio::test]
    async fn classifies_in_arrival_order() {
        let (feed, mut output) = SubscriptionFeed::spawn(classifier(), 8);
        feed.notify(Notification::Reading(reading("2026-02-02_09-38-35_0"))).await.unwrap();
        feed.notify(Notification::Reading(reading("2026-02-02_09-38-41_5"))).await.unwrap();
        let summary = feed.shutdown().await.unwrap();

        let mut steps = Vec::new();
        while let Some(FeedOutput::Record(record)) = output.recv().await {
            steps.push(record.step);
        }
        assert_eq!(steps, vec![1, 2]);
        assert_eq!(summary.records, 2);
        assert_eq!(summary.notifications, 2);
    }

    #[tokio::test]
    async fn put_events_are_flattened_and_sorted() {
        let (feed, mut output) = SubscriptionFeed::spawn(classifier(), 8);
        feed.notify(Notification::Put {
            path: "/Device_1/BME_01/Hp_301".into(),
            data: json!({
                "2026-02-02_09-38-42_0": { "gas_resistance": 2.0 },
                "2026-02-02_09-38-35_0": { "gas_resistance": 1.0 }
            }),
        })
        .await
        .unwrap();
        feed.shutdown().await.unwrap();

        let first = output.recv().await;
        let second = output.recv().await;
        match (first, second) {
            (Some(FeedOutput::Record(a)), Some(FeedOutput::Record(b))) => {
                assert_eq!(a.step, 1);
                assert_eq!(b.step, 3);
            }
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[tokio::test]
    async fn events_follow_their_record() {
        let (feed, mut output) = SubscriptionFeed::spawn(classifier(), 8);
        feed.notify(Notification::Reading(Reading::new("Device_1", "BME_02", "HP_999", "2026-02-02_09-38-35_0")))
            .await
            .unwrap();
        let summary = feed.shutdown().await.unwrap();

        match output.recv().await {
            Some(FeedOutput::Record(record)) => assert_eq!(record.issue, Some(RecordIssue::UnknownProfile)),
            other => panic!("unexpected output {:?}", other),
        }
        assert!(matches!(
            output.recv().await,
            Some(FeedOutput::Event(ClassificationEvent::UnknownProfile { .. }))
        ));
        assert_eq!(summary.events, 1);
    }

    #[tokio::test]
    async fn malformed_put_is_rejected() {
        let (feed, _output) = SubscriptionFeed::spawn(classifier(), 8);
        feed.notify(Notification::Put {
            path: "a/b/c/d/e".into(),
            data: json!({}),
        })
        .await
        .unwrap();
        let summary = feed.shutdown().await.unwrap();
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.records, 0);
    }

    #[tokio::test]
    async fn stops_when_output_is_dropped() {
        let (feed, output) = SubscriptionFeed::spawn(classifier(), 1);
        let sender = feed.sender();
        drop(output);
        sender.notify(Notification::Reading(reading("2026-02-02_09-38-35_0"))).await.unwrap();
        drop(sender);
        let summary = feed.shutdown().await.unwrap();
        assert_eq!(summary.records, 0);
    }
}
