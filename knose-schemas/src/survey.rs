//! Store schema survey
//!
//! Walks a full store dump and summarizes its shape: which devices, sensors
//! and profile labels exist, which fields records carry and what type each
//! field has, and whether timestamp keys follow the expected pattern. Useful
//! before pointing the classifier at an unfamiliar database.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::SchemaResult;

/// Layout of the realtime store
pub const STORE_STRUCTURE: &str = "Device_X / BME_XX / HP_XXX / timestamp / { record }";

/// Timestamp key pattern, `YYYY-MM-DD_HH-MM-SS_<fraction>`
pub const TIMESTAMP_KEY_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}_\d{2}-\d{2}-\d{2}_\d+$";

/// JSON type name of a value
pub fn infer_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Object(_) => "object",
        Value::Array(_) => "array",
    }
}

/// Type and example value of one record field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSample {
    /// Inferred JSON type
    #[serde(rename = "type")]
    pub type_name: &'static str,
    /// Value from the sampled record
    pub sample: Value,
}

/// Totals across the dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SurveyStats {
    /// Distinct device keys
    pub total_devices: usize,
    /// Distinct sensor keys across devices
    pub total_sensors: usize,
    /// Distinct profile labels across sensors
    pub total_profiles: usize,
    /// Records under every label
    pub total_records: usize,
}

/// Structural summary of a store dump
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreSurvey {
    /// Layout description
    pub structure: &'static str,
    /// Device keys
    pub devices: BTreeSet<String>,
    /// Sensor keys, merged across devices
    pub sensors: BTreeSet<String>,
    /// Profile labels, merged across sensors
    pub profile_labels: BTreeSet<String>,
    /// Union of field names over all object records
    pub record_fields: BTreeSet<String>,
    /// Field types from the first non-empty record
    pub field_types: BTreeMap<String, FieldSample>,
    /// Timestamp keys matching [`TIMESTAMP_KEY_PATTERN`]
    pub matching_timestamp_keys: usize,
    /// Timestamp keys that do not match it
    pub nonmatching_timestamp_keys: usize,
    /// Totals
    pub stats: SurveyStats,
}

impl Default for StoreSurvey {
    fn default() -> Self {
        Self {
            structure: STORE_STRUCTURE,
            devices: BTreeSet::new(),
            sensors: BTreeSet::new(),
            profile_labels: BTreeSet::new(),
            record_fields: BTreeSet::new(),
            field_types: BTreeMap::new(),
            matching_timestamp_keys: 0,
            nonmatching_timestamp_keys: 0,
            stats: SurveyStats::default(),
        }
    }
}

impl StoreSurvey {
    /// Survey a full store dump
    pub fn of(root: &Value) -> SchemaResult<Self> {
        let key_pattern = Regex::new(TIMESTAMP_KEY_PATTERN)?;
        let mut survey = Self::default();
        let Some(devices) = root.as_object() else {
            return Ok(survey);
        };

        for (device_id, device) in devices {
            survey.devices.insert(device_id.clone());
            let Some(sensors) = device.as_object() else { continue };
            for (sensor_id, sensor) in sensors {
                survey.sensors.insert(sensor_id.clone());
                let Some(labels) = sensor.as_object() else { continue };
                for (label, records) in labels {
                    survey.profile_labels.insert(label.clone());
                    let Some(records) = records.as_object() else { continue };
                    for (key, record) in records {
                        survey.add_record(&key_pattern, key, record);
                    }
                }
            }
        }

        survey.stats = SurveyStats {
            total_devices: survey.devices.len(),
            total_sensors: survey.sensors.len(),
            total_profiles: survey.profile_labels.len(),
            total_records: survey.stats.total_records,
        };
        log::debug!(
            "Surveyed {} records across {} devices",
            survey.stats.total_records,
            survey.stats.total_devices
        );
        Ok(survey)
    }

    fn add_record(&mut self, key_pattern: &Regex, key: &str, record: &Value) {
        self.stats.total_records += 1;
        if key_pattern.is_match(key) {
            self.matching_timestamp_keys += 1;
        } else {
            self.nonmatching_timestamp_keys += 1;
        }

        let Some(fields) = record.as_object() else { return };
        self.record_fields.extend(fields.keys().cloned());
        if self.field_types.is_empty() && !fields.is_empty() {
            self.field_types = fields
                .iter()
                .map(|(name, value)| {
                    let sample = FieldSample {
                        type_name: infer_type(value),
                        sample: value.clone(),
                    };
                    (name.clone(), sample)
                })
                .collect();
        }
    }

    /// True when every timestamp key follows the pattern
    pub fn timestamp_keys_conform(&self) -> bool {
        self.nonmatching_timestamp_keys == 0
    }

    /// Render as pretty-printed JSON
    pub fn to_json_string(&self) -> SchemaResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
