//! Cycle tracking
//!
//! Converts an absolute reading timestamp into "seconds since the current
//! heater cycle began", deciding along the way when a new cycle starts.
//! There is one [`CycleTracker`] per `(device, sensor, profile label)` key;
//! [`CycleTrackers`] owns them all for a run.
//!
//! ## Transition Rules
//!
//! For a reading at `T` on a profile of duration `D`:
//!
//! 1. **Start / profile switch**: no state for the key yet, or the sensor was
//!    last seen running a different profile: anchor a new cycle at `T`.
//! 2. **Session gap**: `T - last > gap_reset_factor × D`: the sensor was
//!    stopped in between, anchor a new cycle at `T`.
//! 3. **Boundary crossing**: `T - start ≥ D`: move the anchor forward by the
//!    whole number of cycles elapsed, keeping the phase:
//!
//! ```text
//! start                 start + 2D      T = start + 2.3D
//!   |---- cycle ----|---- cycle ----|--x
//!                                   ^ new start, elapsed = 0.3D
//! ```
//!
//! Re-anchoring at `T` on every crossing would shift the phase by the
//! sampling jitter each cycle, so rule 3 never does that.
//!
//! Readings for a key must arrive in non-decreasing time order. A reading
//! older than the last one seen is treated as a fresh session rather than
//! producing a negative elapsed time.

use alloc::collections::BTreeMap;
use alloc::string::String;

use crate::constants::cycle::FIRST_CYCLE_INDEX;
use crate::registry::canonical_label;
use crate::time::Timestamp;

/// Physical sensor identity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorKey {
    /// Device hosting the sensor, e.g. `Device_1`
    pub device_id: String,
    /// Sensor on the device, e.g. `BME_01`
    pub sensor_id: String,
}

/// Tracker identity: one sensor running one profile
///
/// The label is stored in canonical form so `Hp_301` and `HP_301` share a
/// tracker, while `BME_01` and `BME01` stay distinct sensors.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackerKey {
    /// Device hosting the sensor
    pub device_id: String,
    /// Sensor on the device
    pub sensor_id: String,
    /// Canonical profile label, e.g. `HP_301`
    pub profile_label: String,
}

impl TrackerKey {
    /// Build a key, canonicalizing the label
    pub fn new(device_id: &str, sensor_id: &str, raw_label: &str) -> Self {
        Self {
            device_id: device_id.into(),
            sensor_id: sensor_id.into(),
            profile_label: canonical_label(raw_label),
        }
    }

    /// The sensor part of the key
    pub fn sensor_key(&self) -> SensorKey {
        SensorKey {
            device_id: self.device_id.clone(),
            sensor_id: self.sensor_id.clone(),
        }
    }
}

/// Mutable per-key cycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CycleState {
    /// Phase anchor of the current cycle
    pub cycle_start: Timestamp,
    /// Most recent reading applied
    pub last_timestamp: Timestamp,
    /// Cycle counter, 1 for the first cycle
    pub cycle_index: u32,
}

/// Which rule fired for an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CycleTransition {
    /// First reading for the key
    Started,
    /// Sensor switched to this profile from another one
    ProfileSwitch,
    /// Silence longer than the session gap
    GapReset,
    /// Reading older than the previous one
    OutOfOrder,
    /// Boundary moved forward by whole cycles
    Advanced {
        /// Whole cycles skipped
        cycles: u32,
    },
    /// Still inside the current cycle
    Continued,
}

impl CycleTransition {
    /// True when the anchor was moved to the reading itself
    pub fn is_reanchor(&self) -> bool {
        matches!(self, Self::ProfileSwitch | Self::GapReset | Self::OutOfOrder)
    }
}

/// Outcome of applying one reading to a tracker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleUpdate {
    /// Cycle the reading belongs to
    pub cycle_index: u32,
    /// Seconds since the cycle anchor, in `[0, D)`
    pub elapsed_in_cycle_s: f64,
    /// Anchor of that cycle
    pub cycle_start: Timestamp,
    /// Rule that fired
    pub transition: CycleTransition,
}

/// State machine for one tracker key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleTracker {
    state: CycleState,
}

impl CycleTracker {
    /// Tracker whose first cycle is anchored at `at`
    pub fn start(at: Timestamp) -> Self {
        Self {
            state: CycleState {
                cycle_start: at,
                last_timestamp: at,
                cycle_index: FIRST_CYCLE_INDEX,
            },
        }
    }

    /// Resume from a previously captured state
    pub fn from_state(state: CycleState) -> Self {
        Self { state }
    }

    /// Current state
    pub fn state(&self) -> &CycleState {
        &self.state
    }

    /// Result for the reading that created this tracker
    pub fn started_update(&self) -> CycleUpdate {
        self.update(CycleTransition::Started, 0.0)
    }

    /// Apply a reading at `at`
    ///
    /// `profile_switched` is rule 1 for an existing key: the sensor's previous
    /// reading was on another profile.
    pub fn observe(
        &mut self,
        at: Timestamp,
        total_duration_s: f64,
        gap_reset_factor: f64,
        profile_switched: bool,
    ) -> CycleUpdate {
        if profile_switched {
            return self.reanchor(at, CycleTransition::ProfileSwitch);
        }
        if at < self.state.last_timestamp {
            log_warn!(
                "Reading at {} precedes last reading at {}, starting new cycle",
                at,
                self.state.last_timestamp
            );
            return self.reanchor(at, CycleTransition::OutOfOrder);
        }
        if at.seconds_since(self.state.last_timestamp) > gap_reset_factor * total_duration_s {
            return self.reanchor(at, CycleTransition::GapReset);
        }

        let mut transition = CycleTransition::Continued;
        let raw_elapsed = at.seconds_since(self.state.cycle_start);
        if raw_elapsed >= total_duration_s {
            let whole = libm::floor(raw_elapsed / total_duration_s);
            self.state.cycle_start = self.state.cycle_start.advanced_by_secs(whole * total_duration_s);
            let cycles = whole as u32;
            self.state.cycle_index = self.state.cycle_index.saturating_add(cycles);
            transition = CycleTransition::Advanced { cycles };
        }
        self.state.last_timestamp = at;

        let mut elapsed = at.seconds_since(self.state.cycle_start);
        // nanosecond rounding of the anchor can land a hair outside [0, D)
        if elapsed >= total_duration_s {
            self.state.cycle_start = self.state.cycle_start.advanced_by_secs(total_duration_s);
            self.state.cycle_index = self.state.cycle_index.saturating_add(1);
            elapsed = at.seconds_since(self.state.cycle_start);
        }
        let elapsed = elapsed.max(0.0);

        self.update(transition, elapsed)
    }

    fn reanchor(&mut self, at: Timestamp, transition: CycleTransition) -> CycleUpdate {
        log_debug!("Cycle re-anchored at {} ({:?})", at, transition);
        self.state.cycle_start = at;
        self.state.last_timestamp = at;
        self.state.cycle_index = self.state.cycle_index.saturating_add(1);
        self.update(transition, 0.0)
    }

    fn update(&self, transition: CycleTransition, elapsed_in_cycle_s: f64) -> CycleUpdate {
        CycleUpdate {
            cycle_index: self.state.cycle_index,
            elapsed_in_cycle_s,
            cycle_start: self.state.cycle_start,
            transition,
        }
    }
}

/// All trackers of a run, plus the last profile seen per sensor
#[derive(Debug, Clone, Default)]
pub struct CycleTrackers {
    trackers: BTreeMap<TrackerKey, CycleTracker>,
    last_labels: BTreeMap<SensorKey, String>,
}

impl CycleTrackers {
    /// Empty tracker set
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a reading at `at` for `key`
    pub fn update(
        &mut self,
        key: &TrackerKey,
        at: Timestamp,
        total_duration_s: f64,
        gap_reset_factor: f64,
    ) -> CycleUpdate {
        let profile_switched = record_label(&mut self.last_labels, key);

        match self.trackers.get_mut(key) {
            Some(tracker) => tracker.observe(at, total_duration_s, gap_reset_factor, profile_switched),
            None => {
                let tracker = CycleTracker::start(at);
                let update = tracker.started_update();
                self.trackers.insert(key.clone(), tracker);
                update
            }
        }
    }

    /// State for a key, if any reading has been seen
    pub fn state(&self, key: &TrackerKey) -> Option<&CycleState> {
        self.trackers.get(key).map(CycleTracker::state)
    }

    /// Number of keys seen
    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    /// True before the first reading
    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }
}

/// Note the label a sensor is running; true if it differs from the last one
pub(crate) fn record_label(last_labels: &mut BTreeMap<SensorKey, String>, key: &TrackerKey) -> bool {
    let sensor = key.sensor_key();
    match last_labels.get_mut(&sensor) {
        Some(previous) if *previous == key.profile_label => false,
        Some(previous) => {
            *previous = key.profile_label.clone();
            true
        }
        None => {
            last_labels.insert(sensor, key.profile_label.clone());
            false
        }
    }
}
