//! Heater profile catalogs
//!
//! A catalog file lists profiles with their breakpoints:
//!
//! ```json
//! {
//!   "profiles": [
//!     {
//!       "id": 322,
//!       "total_duration_s": 10.0,
//!       "steps": [
//!         { "time_offset_s": 0.0, "step": 1, "temperature_c": 150.0 },
//!         { "time_offset_s": 4.0, "step": 2, "temperature_c": 250.0 }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Catalogs are plain data; validation happens when they are turned into
//! [`HeaterProfile`]s.

use std::fs;
use std::path::Path;

use knose_core::constants::DEFAULT_CATALOG;
use knose_core::{HeaterProfile, ProfileId, ProfileRegistry, StaticProfile, TimeStepEntry};
use serde::{Deserialize, Serialize};

use crate::SchemaResult;

/// One breakpoint as written in a catalog file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Offset from the start of the cycle (seconds)
    pub time_offset_s: f64,
    /// Authored step number
    pub step: i32,
    /// Target heater temperature (°C)
    pub temperature_c: f64,
}

/// One profile as written in a catalog file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDefinition {
    /// Numeric profile id, `301` for `HP_301`
    pub id: ProfileId,
    /// Length of one cycle (seconds)
    pub total_duration_s: f64,
    /// Breakpoints in authored order
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

impl ProfileDefinition {
    /// Validate into an engine profile
    pub fn to_profile(&self) -> SchemaResult<HeaterProfile> {
        let entries = self
            .steps
            .iter()
            .map(|s| TimeStepEntry::new(s.time_offset_s, s.step, s.temperature_c))
            .collect();
        Ok(HeaterProfile::new(self.id, self.total_duration_s, entries)?)
    }
}

impl From<&StaticProfile> for ProfileDefinition {
    fn from(table: &StaticProfile) -> Self {
        Self {
            id: table.id,
            total_duration_s: table.total_duration_s,
            steps: table
                .steps
                .iter()
                .map(|&(time_offset_s, step, temperature_c)| StepDefinition {
                    time_offset_s,
                    step,
                    temperature_c,
                })
                .collect(),
        }
    }
}

/// A set of profile definitions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileCatalog {
    /// Profiles in file order
    pub profiles: Vec<ProfileDefinition>,
}

impl ProfileCatalog {
    /// The catalog compiled into `knose-core`
    pub fn bundled() -> Self {
        Self {
            profiles: DEFAULT_CATALOG.iter().map(ProfileDefinition::from).collect(),
        }
    }

    /// Parse a catalog from JSON text
    pub fn from_json_str(json: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a catalog file
    pub fn from_path<P: AsRef<Path>>(path: P) -> SchemaResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_json_str(&text)?;
        log::debug!(
            "Loaded {} profiles from {}",
            catalog.profiles.len(),
            path.as_ref().display()
        );
        Ok(catalog)
    }

    /// Render as pretty-printed JSON
    pub fn to_json_string(&self) -> SchemaResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write a catalog file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> SchemaResult<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Add `other`'s profiles, replacing any with the same id
    pub fn merge(mut self, other: ProfileCatalog) -> Self {
        for profile in other.profiles {
            match self.profiles.iter_mut().find(|p| p.id == profile.id) {
                Some(existing) => {
                    log::debug!("Catalog entry for HP_{} replaced", profile.id);
                    *existing = profile;
                }
                None => self.profiles.push(profile),
            }
        }
        self
    }

    /// Validate every profile
    pub fn to_profiles(&self) -> SchemaResult<Vec<HeaterProfile>> {
        self.profiles.iter().map(ProfileDefinition::to_profile).collect()
    }

    /// Validate and build a registry
    ///
    /// Duplicate ids inside one catalog are an error; use [`merge`](Self::merge)
    /// to layer catalogs.
    pub fn into_registry(self) -> SchemaResult<ProfileRegistry> {
        Ok(ProfileRegistry::new(self.to_profiles()?)?)
    }
}

/// Bundled catalog overlaid with the profiles in `path`
pub fn load_registry<P: AsRef<Path>>(path: P) -> SchemaResult<ProfileRegistry> {
    ProfileCatalog::bundled()
        .merge(ProfileCatalog::from_path(path)?)
        .into_registry()
}
