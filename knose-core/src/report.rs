//! Per-group classification summary
//!
//! Groups classified records by `(sensor, canonical profile label)` and
//! compares the steps actually observed with the steps the profile defines.
//! A report is derived output only; nothing in it is read back by the
//! classifier.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;

use crate::events::RecordIssue;
use crate::normalize::StepMapCache;
use crate::reading::ClassifiedRecord;
use crate::registry::{canonical_label, parse_profile_label};

/// Report grouping key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupKey {
    /// Sensor, e.g. `BME_01`
    pub sensor_id: String,
    /// Canonical profile label, e.g. `HP_301`
    pub profile_label: String,
}

/// Summary for one `(sensor, profile)` group
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupReport {
    /// Group this summary covers
    pub key: GroupKey,
    /// Steps the profile defines (0 for unknown profiles)
    pub expected_step_count: usize,
    /// Distinct steps seen in records classified from profile data
    pub observed_steps: BTreeSet<u32>,
    /// Steps in `1..=expected_step_count` never observed
    pub missing_steps: Vec<u32>,
    /// Authored step numbers the profile skips
    pub missing_authored_steps: Vec<i32>,
    /// Records flagged `is_anomaly`
    pub anomaly_count: usize,
    /// Records whose label did not resolve
    pub unknown_profile_count: usize,
    /// Records whose timestamp key did not parse
    pub malformed_timestamp_count: usize,
    /// Records whose profile has no breakpoints
    pub empty_step_map_count: usize,
    /// All records in the group
    pub record_count: usize,
    /// Highest cycle index seen
    pub max_cycle_index: u32,
}

impl GroupReport {
    /// Empty summary for `key`
    pub fn new(key: GroupKey, expected_step_count: usize, missing_authored_steps: Vec<i32>) -> Self {
        Self {
            key,
            expected_step_count,
            observed_steps: BTreeSet::new(),
            missing_steps: Vec::new(),
            missing_authored_steps,
            anomaly_count: 0,
            unknown_profile_count: 0,
            malformed_timestamp_count: 0,
            empty_step_map_count: 0,
            record_count: 0,
            max_cycle_index: 0,
        }
    }

    fn add(&mut self, record: &ClassifiedRecord) {
        self.record_count += 1;
        self.max_cycle_index = self.max_cycle_index.max(record.cycle_index);
        if record.is_anomaly {
            self.anomaly_count += 1;
        }
        match record.issue {
            None => {
                self.observed_steps.insert(record.step);
            }
            Some(RecordIssue::UnknownProfile) => self.unknown_profile_count += 1,
            Some(RecordIssue::MalformedTimestamp) => self.malformed_timestamp_count += 1,
            Some(RecordIssue::EmptyTimeStepMap) => self.empty_step_map_count += 1,
        }
    }

    fn finish(&mut self) {
        self.missing_steps = (1..=self.expected_step_count as u32)
            .filter(|step| !self.observed_steps.contains(step))
            .collect();
    }

    /// True when every defined step was observed
    pub fn is_complete(&self) -> bool {
        self.missing_steps.is_empty()
    }

    /// Records that carry an issue
    pub fn issue_count(&self) -> usize {
        self.unknown_profile_count + self.malformed_timestamp_count + self.empty_step_map_count
    }
}

/// Summary of a classification run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassificationReport {
    groups: BTreeMap<GroupKey, GroupReport>,
}

impl ClassificationReport {
    /// Build the report for `records`
    ///
    /// Expected step counts come from `step_maps`; labels that do not resolve
    /// to a cached profile expect zero steps.
    pub fn from_records(records: &[ClassifiedRecord], step_maps: &StepMapCache) -> Self {
        let mut groups: BTreeMap<GroupKey, GroupReport> = BTreeMap::new();

        for record in records {
            let key = GroupKey {
                sensor_id: record.reading.sensor_id.clone(),
                profile_label: canonical_label(&record.reading.profile_label),
            };
            let group = groups.entry(key.clone()).or_insert_with(|| {
                let map = parse_profile_label(&record.reading.profile_label)
                    .and_then(|id| step_maps.get(id));
                GroupReport::new(
                    key,
                    map.map_or(0, |m| m.step_count()),
                    map.map(|m| m.missing_authored_steps().to_vec()).unwrap_or_default(),
                )
            });
            group.add(record);
        }

        for group in groups.values_mut() {
            group.finish();
        }
        Self { groups }
    }

    /// Summary for one group
    pub fn get(&self, sensor_id: &str, profile_label: &str) -> Option<&GroupReport> {
        self.groups.get(&GroupKey {
            sensor_id: sensor_id.into(),
            profile_label: canonical_label(profile_label),
        })
    }

    /// All groups in key order
    pub fn groups(&self) -> impl Iterator<Item = &GroupReport> {
        self.groups.values()
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True for an empty run
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Records across all groups
    pub fn total_records(&self) -> usize {
        self.groups.values().map(|g| g.record_count).sum()
    }
}
