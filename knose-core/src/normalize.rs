//! Step map normalization
//!
//! Authored step numbers come straight from the profile authoring tool and
//! may skip values (`1, 2, 4, 5` with no `3`). Classification instead needs a
//! contiguous `1..=N` numbering in time order. [`normalize`] produces that
//! numbering and records which authored numbers were skipped.
//!
//! ## Anomaly Flag
//!
//! The entry whose authored step directly follows a skipped number is the one
//! that "absorbed" the missing phase, so it is flagged `is_anomaly`. The flag
//! is a static property of the profile's authoring, never of incoming data:
//!
//! ```text
//! authored:   1   2   4   5   8
//! missing:            3       6 7
//! sequential: 1   2   3   4   5
//! anomaly:            ^       ^
//! ```
//!
//! Normalization is a pure function of an immutable profile, so its output is
//! computed once per profile and kept in a [`StepMapCache`].

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use crate::errors::{ClassificationError, ClassificationResult};
use crate::profile::{HeaterProfile, ProfileId, TimeStepEntry};
use crate::registry::ProfileRegistry;

/// Breakpoint with its contiguous step number
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalizedStepEntry {
    /// Offset from the start of the cycle (seconds)
    pub time_offset_s: f64,
    /// Position in time order, starting at 1
    pub sequential_step: u32,
    /// Target heater temperature (°C)
    pub temperature_c: f64,
    /// Step number as authored
    pub authored_step: i32,
    /// Entry directly follows a gap in the authored numbering
    pub is_anomaly: bool,
}

/// Normalized view of one profile
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalizedStepMap {
    entries: Vec<NormalizedStepEntry>,
    missing_authored_steps: Vec<i32>,
}

impl NormalizedStepMap {
    /// Entries in ascending offset order
    pub fn entries(&self) -> &[NormalizedStepEntry] {
        &self.entries
    }

    /// Authored step numbers absent from `[min, max]`, ascending
    pub fn missing_authored_steps(&self) -> &[i32] {
        &self.missing_authored_steps
    }

    /// Number of sequential steps
    pub fn step_count(&self) -> usize {
        self.entries.len()
    }

    /// True when the profile has no breakpoints
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when any authored step number was skipped
    pub fn has_gaps(&self) -> bool {
        !self.missing_authored_steps.is_empty()
    }
}

/// Renumber a profile's breakpoints as `1..=N` in time order
pub fn normalize(profile: &HeaterProfile) -> NormalizedStepMap {
    let mut by_step: Vec<&TimeStepEntry> = profile.time_step_map().iter().collect();
    by_step.sort_by_key(|entry| entry.authored_step);

    let missing = missing_steps(&by_step);

    // stable: entries sharing an offset keep authored-step order
    let mut by_offset = by_step;
    by_offset.sort_by(|a, b| a.time_offset_s.total_cmp(&b.time_offset_s));

    let entries = by_offset
        .iter()
        .enumerate()
        .map(|(index, entry)| NormalizedStepEntry {
            time_offset_s: entry.time_offset_s,
            sequential_step: index as u32 + 1,
            temperature_c: entry.temperature_c,
            authored_step: entry.authored_step,
            is_anomaly: entry
                .authored_step
                .checked_sub(1)
                .map_or(false, |previous| missing.contains(&previous)),
        })
        .collect();

    NormalizedStepMap {
        entries,
        missing_authored_steps: missing.into_iter().collect(),
    }
}

/// Every integer in `[min, max]` not present; input sorted by authored step
fn missing_steps(sorted: &[&TimeStepEntry]) -> BTreeSet<i32> {
    let mut missing = BTreeSet::new();
    for pair in sorted.windows(2) {
        let (low, high) = (pair[0].authored_step, pair[1].authored_step);
        let mut step = low.saturating_add(1);
        while step < high {
            missing.insert(step);
            step += 1;
        }
    }
    missing
}

/// Normalized step maps for every catalogued profile
///
/// Built once from a registry; lookups afterwards are read-only, so one cache
/// can be shared across threads without locking.
#[derive(Debug, Clone, Default)]
pub struct StepMapCache {
    maps: BTreeMap<ProfileId, NormalizedStepMap>,
}

impl StepMapCache {
    /// Normalize every profile in the registry
    pub fn warm(registry: &ProfileRegistry) -> Self {
        let maps = registry
            .iter()
            .map(|profile| {
                let map = normalize(profile);
                if map.has_gaps() {
                    log_debug!(
                        "Profile {} skips authored steps {:?}",
                        profile.id(),
                        map.missing_authored_steps()
                    );
                }
                (profile.id(), map)
            })
            .collect();
        Self { maps }
    }

    /// Normalized map for a profile id
    pub fn get(&self, id: ProfileId) -> Option<&NormalizedStepMap> {
        self.maps.get(&id)
    }

    /// Breakpoints to classify against
    ///
    /// Fails with `EmptyTimeStepMap` when the profile has no breakpoints or
    /// was never cached.
    pub fn breakpoints(&self, id: ProfileId) -> ClassificationResult<&[NormalizedStepEntry]> {
        match self.maps.get(&id) {
            Some(map) if !map.is_empty() => Ok(map.entries()),
            _ => Err(ClassificationError::EmptyTimeStepMap { profile_id: id }),
        }
    }

    /// Number of cached profiles
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// True when nothing is cached
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}
