//! Time-to-step lookup
//!
//! A heater profile is a sequence of held plateaus. The active step at a
//! given point in the cycle is the last breakpoint whose offset has been
//! reached (right-continuous, left-inclusive):
//!
//! ```text
//! offset:   0         6  7     9 ...
//! step:     |--- 1 ---|2-|- 3 -|- 4 ...
//!                     ^ elapsed = 6.0 is already step 2
//! ```
//!
//! An elapsed value before the first breakpoint selects the first entry.

use crate::constants::cycle::{DEFAULT_STEP, DEFAULT_TEMPERATURE_C};
use crate::normalize::NormalizedStepEntry;

/// Result of a step lookup
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepClassification {
    /// Sequential step, 1-based
    pub step: u32,
    /// Target heater temperature (°C)
    pub temperature_c: f64,
    /// Step follows a gap in the authored numbering
    pub is_anomaly: bool,
}

impl StepClassification {
    /// Fallback used when no profile data applies
    pub const DEFAULT: Self = Self {
        step: DEFAULT_STEP,
        temperature_c: DEFAULT_TEMPERATURE_C,
        is_anomaly: false,
    };
}

impl Default for StepClassification {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<&NormalizedStepEntry> for StepClassification {
    fn from(entry: &NormalizedStepEntry) -> Self {
        Self {
            step: entry.sequential_step,
            temperature_c: entry.temperature_c,
            is_anomaly: entry.is_anomaly,
        }
    }
}

/// Classify a point in the cycle against a normalized step map
///
/// `entries` must be in ascending offset order, as produced by
/// [`normalize`](crate::normalize::normalize). When several entries share the
/// winning offset the last one applies.
pub fn classify(entries: &[NormalizedStepEntry], elapsed_in_cycle_s: f64) -> StepClassification {
    let Some(first) = entries.first() else {
        return StepClassification::DEFAULT;
    };

    let reached = entries.partition_point(|entry| entry.time_offset_s <= elapsed_in_cycle_s);
    match reached.checked_sub(1) {
        Some(index) => StepClassification::from(&entries[index]),
        None => StepClassification::from(first),
    }
}
