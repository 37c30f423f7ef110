//! Heater profile registry
//!
//! Immutable catalog mapping profile ids to [`HeaterProfile`]s, plus the
//! label grammar used by the realtime store. Labels are case-insensitive
//! `HP`, an optional underscore and a numeric id: `Hp_301`, `HP_301` and
//! `hp301` all name profile 301.
//!
//! The catalog is passed in at construction rather than baked into the
//! lookup logic, so tests and deployments can swap it freely.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};

use crate::constants::profiles::DEFAULT_CATALOG;
use crate::errors::{ClassificationError, ClassificationResult};
use crate::profile::{HeaterProfile, ProfileId, StaticProfile};

/// Parse a store label into a profile id
///
/// Returns `None` when the label does not follow the `HP[_]<digits>` grammar.
pub fn parse_profile_label(raw: &str) -> Option<ProfileId> {
    let label = raw.trim();
    let prefix = label.get(..2)?;
    if !prefix.eq_ignore_ascii_case("hp") {
        return None;
    }

    let rest = &label[2..];
    let digits = rest.strip_prefix('_').unwrap_or(rest).trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Canonical spelling of a label
///
/// Parseable labels become `HP_<id>`; anything else is kept as written
/// (trimmed) so distinct bad labels stay distinct in reports.
pub fn canonical_label(raw: &str) -> String {
    match parse_profile_label(raw) {
        Some(id) => format!("HP_{}", id),
        None => raw.trim().to_string(),
    }
}

/// Read-only heater profile catalog
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<ProfileId, HeaterProfile>,
}

impl ProfileRegistry {
    /// Build a registry from a set of profiles
    ///
    /// Fails if two profiles share an id.
    pub fn new<I>(profiles: I) -> ClassificationResult<Self>
    where
        I: IntoIterator<Item = HeaterProfile>,
    {
        let mut map = BTreeMap::new();
        for profile in profiles {
            let id = profile.id();
            if map.insert(id, profile).is_some() {
                return Err(ClassificationError::DuplicateProfile { profile_id: id });
            }
        }
        log_debug!("Profile registry built with {} profiles", map.len());
        Ok(Self { profiles: map })
    }

    /// Build a registry from compile-time tables
    pub fn from_static(tables: &[StaticProfile]) -> ClassificationResult<Self> {
        let profiles = tables
            .iter()
            .map(StaticProfile::to_profile)
            .collect::<ClassificationResult<alloc::vec::Vec<_>>>()?;
        Self::new(profiles)
    }

    /// Registry holding the bundled catalog
    pub fn with_default_catalog() -> ClassificationResult<Self> {
        Self::from_static(DEFAULT_CATALOG)
    }

    /// Resolve a raw store label to its profile
    pub fn resolve(&self, raw_label: &str) -> ClassificationResult<&HeaterProfile> {
        parse_profile_label(raw_label)
            .and_then(|id| self.profiles.get(&id))
            .ok_or_else(|| ClassificationError::UnknownProfile {
                label: raw_label.to_string(),
            })
    }

    /// Profile by id
    pub fn get(&self, id: ProfileId) -> Option<&HeaterProfile> {
        self.profiles.get(&id)
    }

    /// All profiles in id order
    pub fn iter(&self) -> impl Iterator<Item = &HeaterProfile> {
        self.profiles.values()
    }

    /// Number of catalogued profiles
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// True when no profiles are catalogued
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
