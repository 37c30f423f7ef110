//! Named catalogs and reading sets

use std::sync::Arc;

use knose_core::{HeaterProfile, ProfileRegistry, TimeStepEntry};

/// HP-301 breakpoint offsets (seconds)
pub const HP301_OFFSETS: [f64; 10] = [0.0, 6.0, 7.0, 9.0, 11.0, 12.0, 13.0, 15.0, 17.0, 18.0];

/// HP-301 temperatures at those offsets (°C)
pub const HP301_TEMPERATURES: [f64; 10] = [100.0, 100.0, 200.0, 200.0, 200.0, 200.0, 320.0, 320.0, 320.0, 320.0];

/// HP-301 cycle length
pub const HP301_DURATION_S: f64 = 18.0;

/// Profile whose authoring skipped steps 3, 6 and 7
pub fn gapped_profile() -> HeaterProfile {
    HeaterProfile::new(
        900,
        10.0,
        vec![
            TimeStepEntry::new(0.0, 1, 150.0),
            TimeStepEntry::new(2.0, 2, 200.0),
            TimeStepEntry::new(4.0, 4, 250.0),
            TimeStepEntry::new(6.0, 5, 300.0),
            TimeStepEntry::new(8.0, 8, 350.0),
        ],
    )
    .unwrap()
}

/// Bundled catalog
pub fn default_registry() -> Arc<ProfileRegistry> {
    Arc::new(ProfileRegistry::with_default_catalog().unwrap())
}

/// Bundled catalog plus [`gapped_profile`]
pub fn mixed_registry() -> Arc<ProfileRegistry> {
    let mut profiles: Vec<HeaterProfile> = ProfileRegistry::with_default_catalog()
        .unwrap()
        .iter()
        .cloned()
        .collect();
    profiles.push(gapped_profile());
    Arc::new(ProfileRegistry::new(profiles).unwrap())
}
