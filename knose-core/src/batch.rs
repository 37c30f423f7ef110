//! Batch classification
//!
//! [`BatchClassifier`] drives the whole engine over a set of readings:
//!
//! ```text
//! readings ─ sort (timestamp, sensor) ─┬─ resolve label ─ step map
//!                                      └─ tracker update ─ classify ─ record
//! ```
//!
//! Per-reading problems (unknown label, malformed timestamp key, profile
//! without breakpoints) never abort the batch; the reading is emitted with the
//! default classification and an [`RecordIssue`], and an event is logged.
//!
//! Tracker state lives in the classifier, not in the batch, so successive
//! calls continue the same cycles.

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::classifier::{classify, StepClassification};
use crate::config::ClassifierConfig;
use crate::constants::cycle::FIRST_CYCLE_INDEX;
use crate::events::{ClassificationEvent, RecordIssue};
use crate::normalize::{NormalizedStepEntry, StepMapCache};
use crate::reading::{ClassifiedRecord, Reading};
use crate::registry::ProfileRegistry;
use crate::report::ClassificationReport;
use crate::time::Timestamp;
use crate::tracker::{CycleTrackers, CycleUpdate, TrackerKey};

/// Everything a batch run produces
#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// One record per input reading, in processing order
    pub records: Vec<ClassifiedRecord>,
    /// Per (sensor, profile) summary of `records`
    pub report: ClassificationReport,
    /// Events raised while classifying this batch
    pub events: Vec<ClassificationEvent>,
}

/// Single-threaded classifier owning its tracker state
#[derive(Debug, Clone)]
pub struct BatchClassifier {
    registry: Arc<ProfileRegistry>,
    step_maps: Arc<StepMapCache>,
    trackers: CycleTrackers,
    config: ClassifierConfig,
    events: Vec<ClassificationEvent>,
}

impl BatchClassifier {
    /// Classifier over `registry` with default settings
    pub fn new(registry: Arc<ProfileRegistry>) -> Self {
        let step_maps = Arc::new(StepMapCache::warm(&registry));
        Self::with_shared(registry, step_maps, ClassifierConfig::default())
    }

    /// Classifier over `registry` with custom settings
    pub fn with_config(registry: Arc<ProfileRegistry>, config: ClassifierConfig) -> Self {
        let step_maps = Arc::new(StepMapCache::warm(&registry));
        Self::with_shared(registry, step_maps, config)
    }

    /// Classifier reusing step maps already built for `registry`
    pub fn with_shared(
        registry: Arc<ProfileRegistry>,
        step_maps: Arc<StepMapCache>,
        config: ClassifierConfig,
    ) -> Self {
        Self {
            registry,
            step_maps,
            trackers: CycleTrackers::new(),
            config,
            events: Vec::new(),
        }
    }

    /// Classify one reading against the current tracker state
    ///
    /// Readings for a tracker key must be fed in timestamp order; use
    /// [`classify_batch`](Self::classify_batch) for unsorted input.
    pub fn classify_reading(&mut self, reading: Reading) -> ClassifiedRecord {
        let trackers = &mut self.trackers;
        let factor = self.config.gap_reset_factor;
        classify_with(
            &self.registry,
            &self.step_maps,
            reading,
            &mut self.events,
            |key, at, duration| trackers.update(key, at, duration, factor),
        )
    }

    /// Classify a batch of readings in any order
    pub fn classify_batch(&mut self, mut readings: Vec<Reading>) -> BatchOutput {
        sort_readings(&mut readings);
        let records: Vec<ClassifiedRecord> = readings
            .into_iter()
            .map(|reading| self.classify_reading(reading))
            .collect();
        let report = ClassificationReport::from_records(&records, &self.step_maps);
        log_debug!(
            "Classified {} readings into {} groups",
            records.len(),
            report.len()
        );

        BatchOutput {
            records,
            report,
            events: self.take_events(),
        }
    }

    /// Drain events raised since the last call
    pub fn take_events(&mut self) -> Vec<ClassificationEvent> {
        core::mem::take(&mut self.events)
    }

    /// Profile catalog
    pub fn registry(&self) -> &Arc<ProfileRegistry> {
        &self.registry
    }

    /// Normalized step maps
    pub fn step_maps(&self) -> &Arc<StepMapCache> {
        &self.step_maps
    }

    /// Tracker state
    pub fn trackers(&self) -> &CycleTrackers {
        &self.trackers
    }

    /// Active settings
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }
}

/// Stable sort by `(timestamp, sensor_id)`
///
/// Malformed keys carry the earliest sentinel and therefore sort first.
pub fn sort_readings(readings: &mut [Reading]) {
    readings.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.sensor_id.cmp(&b.sensor_id))
    });
}

/// Resolve, track and classify one reading
///
/// `track` applies the reading to whatever tracker store the caller owns.
/// It is only called for readings with a valid timestamp and a known profile.
pub(crate) fn classify_with<F>(
    registry: &ProfileRegistry,
    step_maps: &StepMapCache,
    reading: Reading,
    events: &mut Vec<ClassificationEvent>,
    track: F,
) -> ClassifiedRecord
where
    F: FnOnce(&TrackerKey, Timestamp, f64) -> CycleUpdate,
{
    if !reading.has_valid_timestamp() {
        log_warn!(
            "Malformed timestamp key {:?} for {}/{}",
            reading.raw_timestamp,
            reading.device_id,
            reading.sensor_id
        );
        events.push(ClassificationEvent::MalformedTimestamp {
            device_id: reading.device_id.clone(),
            sensor_id: reading.sensor_id.clone(),
            label: reading.profile_label.clone(),
            raw_timestamp: reading.raw_timestamp.clone(),
        });
        return unclassified(reading, RecordIssue::MalformedTimestamp);
    }

    let profile = match registry.resolve(&reading.profile_label) {
        Ok(profile) => profile,
        Err(_) => {
            log_warn!(
                "Unknown heater profile {:?} on {}/{}",
                reading.profile_label,
                reading.device_id,
                reading.sensor_id
            );
            events.push(ClassificationEvent::UnknownProfile {
                device_id: reading.device_id.clone(),
                sensor_id: reading.sensor_id.clone(),
                label: reading.profile_label.clone(),
                timestamp: reading.timestamp,
            });
            return unclassified(reading, RecordIssue::UnknownProfile);
        }
    };

    let key = reading.tracker_key();
    let update = track(&key, reading.timestamp, profile.total_duration_s());
    if update.transition.is_reanchor() {
        events.push(ClassificationEvent::CycleReset {
            key,
            at: reading.timestamp,
            transition: update.transition,
        });
    }

    let mut issue = None;
    let entries: &[NormalizedStepEntry] = match step_maps.breakpoints(profile.id()) {
        Ok(entries) => entries,
        Err(_) => {
            log_warn!("Profile {} has no breakpoints", profile.label());
            events.push(ClassificationEvent::EmptyTimeStepMap {
                profile_id: profile.id(),
                sensor_id: reading.sensor_id.clone(),
                timestamp: reading.timestamp,
            });
            issue = Some(RecordIssue::EmptyTimeStepMap);
            &[]
        }
    };

    let step = classify(entries, update.elapsed_in_cycle_s);
    ClassifiedRecord {
        reading,
        cycle_index: update.cycle_index,
        elapsed_in_cycle_s: update.elapsed_in_cycle_s,
        step: step.step,
        target_temperature_c: step.temperature_c,
        is_anomaly: step.is_anomaly,
        issue,
    }
}

fn unclassified(reading: Reading, issue: RecordIssue) -> ClassifiedRecord {
    let step = StepClassification::DEFAULT;
    ClassifiedRecord {
        reading,
        cycle_index: FIRST_CYCLE_INDEX,
        elapsed_in_cycle_s: 0.0,
        step: step.step,
        target_temperature_c: step.temperature_c,
        is_anomaly: step.is_anomaly,
        issue: Some(issue),
    }
}
