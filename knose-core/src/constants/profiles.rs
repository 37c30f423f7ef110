//! Bundled Heater Profiles
//!
//! Heater profiles are authored by domain experts as a list of
//! `(time offset, step number, temperature)` breakpoints. The numbering is
//! copied verbatim from the authoring tool, so gaps in `authored_step` are
//! expected and are handled by normalization, not corrected here.
//!
//! Deployments with other profiles load them from a catalog file instead of
//! extending this table.

use crate::profile::StaticProfile;

/// HP-301: 18 second cycle, three plateaus at 100, 200 and 320°C.
///
/// Breakpoints as `(offset seconds, authored step, temperature °C)`.
pub const HP_301: StaticProfile = StaticProfile {
    id: 301,
    total_duration_s: 18.0,
    steps: &[
        (0.0, 1, 100.0),
        (6.0, 2, 100.0),
        (7.0, 3, 200.0),
        (9.0, 4, 200.0),
        (11.0, 5, 200.0),
        (12.0, 6, 200.0),
        (13.0, 7, 320.0),
        (15.0, 8, 320.0),
        (17.0, 9, 320.0),
        (18.0, 10, 320.0),
    ],
};

/// Catalog loaded by `ProfileRegistry::with_default_catalog`.
pub const DEFAULT_CATALOG: &[StaticProfile] = &[HP_301];
