//! Readings in and classified records out
//!
//! A [`Reading`] is one record from the realtime store, addressed by
//! `device / sensor / profile label / timestamp key`. The engine only looks at
//! the address; the record's own fields are carried through untouched in
//! [`Reading::fields`].

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

use crate::events::RecordIssue;
use crate::time::Timestamp;
use crate::tracker::TrackerKey;

/// Scalar value of a raw record field
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FieldValue {
    /// Explicit null
    Null,
    /// Boolean flag
    Bool(bool),
    /// Whole number
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Free text
    Text(String),
}

impl FieldValue {
    /// Type name as reported by the schema survey
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Integer(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "string",
        }
    }

    /// Numeric value, if the field holds a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// One reading from the store
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// Device, e.g. `Device_1`
    pub device_id: String,
    /// Sensor on the device, e.g. `BME_01`
    pub sensor_id: String,
    /// Heater profile label as written in the store, e.g. `Hp_301`
    pub profile_label: String,
    /// Timestamp key as written in the store
    pub raw_timestamp: String,
    /// Parsed timestamp, [`Timestamp::EARLIEST`] when the key is malformed
    pub timestamp: Timestamp,
    /// Record fields, untouched
    pub fields: BTreeMap<String, FieldValue>,
}

impl Reading {
    /// Reading addressed by its store path
    pub fn new(device_id: &str, sensor_id: &str, profile_label: &str, timestamp_key: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            sensor_id: sensor_id.to_string(),
            profile_label: profile_label.to_string(),
            raw_timestamp: timestamp_key.to_string(),
            timestamp: Timestamp::parse_key_or_earliest(timestamp_key),
            fields: BTreeMap::new(),
        }
    }

    /// Reading at an already known instant
    pub fn at(device_id: &str, sensor_id: &str, profile_label: &str, timestamp: Timestamp) -> Self {
        Self {
            device_id: device_id.to_string(),
            sensor_id: sensor_id.to_string(),
            profile_label: profile_label.to_string(),
            raw_timestamp: timestamp.to_string(),
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    /// Attach a record field
    pub fn with_field(mut self, name: &str, value: FieldValue) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// False when the timestamp key could not be parsed
    pub fn has_valid_timestamp(&self) -> bool {
        !self.timestamp.is_sentinel()
    }

    /// Tracker this reading belongs to
    pub fn tracker_key(&self) -> TrackerKey {
        TrackerKey::new(&self.device_id, &self.sensor_id, &self.profile_label)
    }
}

/// A reading annotated with its cycle and step
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassifiedRecord {
    /// The reading as received
    pub reading: Reading,
    /// Cycle counter for the reading's tracker, starting at 1
    pub cycle_index: u32,
    /// Seconds since the cycle anchor
    pub elapsed_in_cycle_s: f64,
    /// Sequential step
    pub step: u32,
    /// Nominal heater temperature for the step (°C)
    pub target_temperature_c: f64,
    /// Step follows a gap in the profile's authored numbering
    pub is_anomaly: bool,
    /// Why the default classification was used, if it was
    pub issue: Option<RecordIssue>,
}

impl ClassifiedRecord {
    /// True when the record was classified from real profile data
    pub fn is_clean(&self) -> bool {
        self.issue.is_none()
    }
}
