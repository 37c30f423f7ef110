//! Classification events
//!
//! Everything the engine recovered from during a run is recorded here, so the
//! report layer can surface data-quality problems instead of silently
//! classifying around them. Events never feed back into classification.

use alloc::string::String;
use core::fmt;

use crate::profile::ProfileId;
use crate::time::Timestamp;
use crate::tracker::{CycleTransition, TrackerKey};

/// Why a record carries the default classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecordIssue {
    /// Label resolved to no catalogued profile
    UnknownProfile,
    /// Timestamp key could not be parsed
    MalformedTimestamp,
    /// Profile is known but has no breakpoints
    EmptyTimeStepMap,
}

impl RecordIssue {
    /// Short machine-friendly name
    pub const fn name(&self) -> &'static str {
        match self {
            RecordIssue::UnknownProfile => "unknown_profile",
            RecordIssue::MalformedTimestamp => "malformed_timestamp",
            RecordIssue::EmptyTimeStepMap => "empty_time_step_map",
        }
    }
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Something the engine noticed while classifying
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClassificationEvent {
    /// Label resolved to no catalogued profile
    UnknownProfile {
        /// Device of the reading
        device_id: String,
        /// Sensor of the reading
        sensor_id: String,
        /// Label as written in the store
        label: String,
        /// When the reading was taken
        timestamp: Timestamp,
    },

    /// Timestamp key could not be parsed
    MalformedTimestamp {
        /// Device of the reading
        device_id: String,
        /// Sensor of the reading
        sensor_id: String,
        /// Label as written in the store
        label: String,
        /// Key as written in the store
        raw_timestamp: String,
    },

    /// Profile has no breakpoints
    EmptyTimeStepMap {
        /// The profile
        profile_id: ProfileId,
        /// Sensor of the reading
        sensor_id: String,
        /// When the reading was taken
        timestamp: Timestamp,
    },

    /// A tracker was re-anchored at a reading
    CycleReset {
        /// Tracker that was reset
        key: TrackerKey,
        /// Reading that triggered it
        at: Timestamp,
        /// Rule that fired
        transition: CycleTransition,
    },
}

impl ClassificationEvent {
    /// Record issue this event corresponds to, if any
    pub fn issue(&self) -> Option<RecordIssue> {
        match self {
            ClassificationEvent::UnknownProfile { .. } => Some(RecordIssue::UnknownProfile),
            ClassificationEvent::MalformedTimestamp { .. } => Some(RecordIssue::MalformedTimestamp),
            ClassificationEvent::EmptyTimeStepMap { .. } => Some(RecordIssue::EmptyTimeStepMap),
            ClassificationEvent::CycleReset { .. } => None,
        }
    }
}
