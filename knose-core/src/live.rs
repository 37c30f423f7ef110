//! Concurrent classification for live delivery
//!
//! [`LiveClassifier`] accepts readings from many threads at once. Profile data
//! is shared read-only; each tracker key has its own lock, so different
//! sensors never wait on each other:
//!
//! ```text
//! thread A ─ BME_01/HP_301 ─ lock(key A) ─ update ─ classify
//! thread B ─ BME_02/HP_301 ─ lock(key B) ─ update ─ classify
//! ```
//!
//! Readings for a single sensor must still be delivered in timestamp order,
//! typically by one producer per sensor.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::batch::classify_with;
use crate::config::ClassifierConfig;
use crate::events::ClassificationEvent;
use crate::normalize::StepMapCache;
use crate::reading::{ClassifiedRecord, Reading};
use crate::registry::ProfileRegistry;
use crate::time::Timestamp;
use crate::tracker::{record_label, CycleState, CycleTracker, CycleUpdate, SensorKey, TrackerKey};

type TrackerSlot = Arc<Mutex<Option<CycleTracker>>>;

/// Thread-safe classifier with per-key tracker locks
#[derive(Debug)]
pub struct LiveClassifier {
    registry: Arc<ProfileRegistry>,
    step_maps: Arc<StepMapCache>,
    config: ClassifierConfig,
    trackers: RwLock<BTreeMap<TrackerKey, TrackerSlot>>,
    last_labels: Mutex<BTreeMap<SensorKey, String>>,
    events: Mutex<Vec<ClassificationEvent>>,
}

impl LiveClassifier {
    /// Live classifier sharing an existing registry and step map cache
    pub fn new(registry: Arc<ProfileRegistry>, step_maps: Arc<StepMapCache>, config: ClassifierConfig) -> Self {
        Self {
            registry,
            step_maps,
            config,
            trackers: RwLock::new(BTreeMap::new()),
            last_labels: Mutex::new(BTreeMap::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Classify one incoming reading
    pub fn on_reading(&self, reading: Reading) -> ClassifiedRecord {
        let mut events = Vec::new();
        let record = classify_with(&self.registry, &self.step_maps, reading, &mut events, |key, at, duration| {
            self.track(key, at, duration)
        });
        if !events.is_empty() {
            lock(&self.events).append(&mut events);
        }
        record
    }

    /// Drain events raised since the last call
    pub fn take_events(&self) -> Vec<ClassificationEvent> {
        std::mem::take(&mut *lock(&self.events))
    }

    /// Snapshot of one tracker's state
    pub fn state(&self, key: &TrackerKey) -> Option<CycleState> {
        let slot = read(&self.trackers).get(key).cloned()?;
        let guard = lock(&slot);
        guard.as_ref().map(|tracker| *tracker.state())
    }

    /// Number of tracker keys seen
    pub fn tracker_count(&self) -> usize {
        read(&self.trackers).len()
    }

    fn track(&self, key: &TrackerKey, at: Timestamp, total_duration_s: f64) -> CycleUpdate {
        // The tracker lock is taken before the label lock is released, so
        // switches reach the trackers in the order they were decided.
        let mut labels = lock(&self.last_labels);
        let profile_switched = record_label(&mut labels, key);
        let slot = self.slot(key);
        let mut guard = lock(&slot);
        drop(labels);
        match guard.as_mut() {
            Some(tracker) => tracker.observe(at, total_duration_s, self.config.gap_reset_factor, profile_switched),
            None => {
                let tracker = CycleTracker::start(at);
                let update = tracker.started_update();
                *guard = Some(tracker);
                update
            }
        }
    }

    fn slot(&self, key: &TrackerKey) -> TrackerSlot {
        if let Some(slot) = read(&self.trackers).get(key) {
            return Arc::clone(slot);
        }
        let mut trackers = self.trackers.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(trackers.entry(key.clone()).or_default())
    }
}

// A panic while holding a tracker lock leaves the state it had; keep using it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::CycleTransition;
    use std::thread;

    fn live() -> Arc<LiveClassifier> {
        let registry = Arc::new(ProfileRegistry::with_default_catalog().unwrap());
        let step_maps = Arc::new(StepMapCache::warm(&registry));
        Arc::new(LiveClassifier::new(registry, step_maps, ClassifierConfig::default()))
    }

    fn at(sensor: &str, secs: f64) -> Reading {
        Reading::at("Device_1", sensor, "Hp_301", Timestamp::from_secs_f64(1_770_000_000.0 + secs))
    }

    #[test]
    fn matches_batch_results_for_one_sensor() {
        let classifier = live();
        let steps: Vec<u32> = [0.0, 6.0, 7.5, 18.0]
            .iter()
            .map(|secs| classifier.on_reading(at("BME_01", *secs)).step)
            .collect();
        assert_eq!(steps, vec![1, 2, 3, 1]);
        let state = classifier.state(&TrackerKey::new("Device_1", "BME_01", "HP_301")).unwrap();
        assert_eq!(state.cycle_index, 2);
    }

    #[test]
    fn sensors_on_separate_threads() {
        let classifier = live();
        let handles: Vec<_> = (0..4)
            .map(|n| {
                let classifier = Arc::clone(&classifier);
                thread::spawn(move || {
                    let sensor = format!("BME_0{}", n);
                    (0..36)
                        .map(|i| classifier.on_reading(at(&sensor, i as f64)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            let records = handle.join().unwrap();
            assert_eq!(records[0].step, 1);
            assert_eq!(records[13].step, 7);
            assert_eq!(records[18].cycle_index, 2);
            assert_eq!(records[18].step, 1);
            assert_eq!(records[35].cycle_index, 2);
        }
        assert_eq!(classifier.tracker_count(), 4);
        assert!(classifier.take_events().is_empty());
    }

    fn live_with_two_profiles() -> Arc<LiveClassifier> {
        use crate::profile::{HeaterProfile, TimeStepEntry};
        let registry = Arc::new(
            ProfileRegistry::new(vec![
                crate::constants::HP_301.to_profile().unwrap(),
                HeaterProfile::new(322, 10.0, vec![TimeStepEntry::new(0.0, 1, 150.0)]).unwrap(),
            ])
            .unwrap(),
        );
        let step_maps = Arc::new(StepMapCache::warm(&registry));
        Arc::new(LiveClassifier::new(registry, step_maps, ClassifierConfig::default()))
    }

    fn on(sensor: &str, label: &str, secs: f64) -> Reading {
        Reading::at("Device_1", sensor, label, Timestamp::from_secs_f64(1_770_000_000.0 + secs))
    }

    #[test]
    fn alternating_profiles_reanchor_every_switch() {
        let classifier = live_with_two_profiles();
        let labels = ["HP_301", "HP_322", "HP_301", "HP_322"];
        let records: Vec<ClassifiedRecord> = labels
            .iter()
            .enumerate()
            .map(|(i, label)| classifier.on_reading(on("BME_01", label, i as f64)))
            .collect();

        let cycles: Vec<u32> = records.iter().map(|r| r.cycle_index).collect();
        assert_eq!(cycles, vec![1, 1, 2, 2]);
        assert!(records.iter().all(|r| r.elapsed_in_cycle_s == 0.0));

        let switches = classifier
            .take_events()
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    ClassificationEvent::CycleReset { transition: CycleTransition::ProfileSwitch, .. }
                )
            })
            .count();
        assert_eq!(switches, 2);
    }

    #[test]
    fn competing_profiles_on_one_sensor_stay_consistent() {
        let classifier = live_with_two_profiles();
        let handles: Vec<_> = ["HP_301", "HP_322"]
            .iter()
            .map(|label| {
                let classifier = Arc::clone(&classifier);
                let label = label.to_string();
                thread::spawn(move || {
                    (0..200)
                        .map(|i| classifier.on_reading(on("BME_01", &label, i as f64 * 0.01)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut total = 0;
        for handle in handles {
            let records = handle.join().unwrap();
            // each key only sees its own, ordered readings
            assert!(records.windows(2).all(|w| w[0].cycle_index <= w[1].cycle_index));
            assert!(records.iter().all(|r| r.is_clean() && r.elapsed_in_cycle_s >= 0.0));
            total += records.len();
        }
        assert_eq!(total, 400);
        assert_eq!(classifier.tracker_count(), 2);

        let events = classifier.take_events();
        assert!(events.iter().all(|e| matches!(
            e,
            ClassificationEvent::CycleReset { transition: CycleTransition::ProfileSwitch, .. }
        )));
    }

    #[test]
    fn events_are_collected() {
        let classifier = live();
        classifier.on_reading(at("BME_01", 0.0));
        classifier.on_reading(at("BME_01", 100.0));
        classifier.on_reading(Reading::at("Device_1", "BME_01", "HP_999", Timestamp::from_secs_f64(1_770_000_101.0)));
        let events = classifier.take_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            ClassificationEvent::CycleReset { transition: CycleTransition::GapReset, .. }
        ));
        assert!(classifier.take_events().is_empty());
    }
}
