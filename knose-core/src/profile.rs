//! Heater profile definitions
//!
//! A heater profile is a fixed-duration duty cycle that a sensor's hot plate
//! repeats indefinitely. It is described by its total duration and a list of
//! breakpoints: from `time_offset_s` onward (within the cycle) the heater
//! holds `temperature_c`, and the authoring tool called that phase
//! `authored_step`.
//!
//! Profiles are validated once when built and never mutated afterwards.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::errors::{ClassificationError, ClassificationResult};

/// Numeric heater profile id, e.g. `301` for `HP_301`
pub type ProfileId = u32;

/// One authored breakpoint of a heater profile
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeStepEntry {
    /// Offset from the start of the cycle where this step begins (seconds)
    pub time_offset_s: f64,
    /// Step number as authored; may skip values
    pub authored_step: i32,
    /// Target heater temperature for this step (°C)
    pub temperature_c: f64,
}

impl TimeStepEntry {
    /// Create a breakpoint
    pub const fn new(time_offset_s: f64, authored_step: i32, temperature_c: f64) -> Self {
        Self {
            time_offset_s,
            authored_step,
            temperature_c,
        }
    }
}

/// Immutable heater profile
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HeaterProfile {
    id: ProfileId,
    total_duration_s: f64,
    time_step_map: Vec<TimeStepEntry>,
}

impl HeaterProfile {
    /// Build a profile, checking the catalog invariants
    ///
    /// - `total_duration_s` must be finite and positive
    /// - every offset must be finite and non-negative
    /// - every temperature must be finite
    ///
    /// An empty step map is accepted; classification falls back to the
    /// default for such profiles.
    pub fn new(
        id: ProfileId,
        total_duration_s: f64,
        time_step_map: Vec<TimeStepEntry>,
    ) -> ClassificationResult<Self> {
        if !total_duration_s.is_finite() || total_duration_s <= 0.0 {
            return Err(ClassificationError::InvalidProfile {
                profile_id: id,
                reason: "total duration must be finite and positive",
            });
        }

        for entry in &time_step_map {
            if !entry.time_offset_s.is_finite() || entry.time_offset_s < 0.0 {
                return Err(ClassificationError::InvalidProfile {
                    profile_id: id,
                    reason: "time offsets must be finite and non-negative",
                });
            }
            if !entry.temperature_c.is_finite() {
                return Err(ClassificationError::InvalidProfile {
                    profile_id: id,
                    reason: "temperatures must be finite",
                });
            }
        }

        Ok(Self {
            id,
            total_duration_s,
            time_step_map,
        })
    }

    /// Profile id
    pub fn id(&self) -> ProfileId {
        self.id
    }

    /// Length of one cycle in seconds
    pub fn total_duration_s(&self) -> f64 {
        self.total_duration_s
    }

    /// Breakpoints in authored order
    pub fn time_step_map(&self) -> &[TimeStepEntry] {
        &self.time_step_map
    }

    /// Canonical label, e.g. `HP_301`
    pub fn label(&self) -> String {
        format!("HP_{}", self.id)
    }
}

/// Compile-time profile table entry
///
/// Breakpoints are `(offset seconds, authored step, temperature °C)`.
#[derive(Debug, Clone, Copy)]
pub struct StaticProfile {
    /// Profile id
    pub id: ProfileId,
    /// Length of one cycle in seconds
    pub total_duration_s: f64,
    /// Authored breakpoints
    pub steps: &'static [(f64, i32, f64)],
}

impl StaticProfile {
    /// Build the runtime profile
    pub fn to_profile(&self) -> ClassificationResult<HeaterProfile> {
        let entries = self
            .steps
            .iter()
            .map(|&(offset, step, temperature)| TimeStepEntry::new(offset, step, temperature))
            .collect();
        HeaterProfile::new(self.id, self.total_duration_s, entries)
    }
}
