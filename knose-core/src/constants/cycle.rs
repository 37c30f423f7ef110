//! Cycle Tracking Constants
//!
//! Values governing when a tracker decides a new heater cycle has begun, and
//! what a reading is classified as when no profile data applies.

/// Gap, in multiples of the profile duration, that starts a new session (dimensionless).
///
/// A silence longer than one and a half cycles cannot be explained by jitter
/// in the sampling schedule; the sensor was stopped and restarted, so the
/// phase anchor from the previous session no longer applies.
pub const GAP_RESET_FACTOR: f64 = 1.5;

/// Smallest accepted gap reset factor.
///
/// Below one cycle every ordinary boundary crossing would look like a restart.
pub const MIN_GAP_RESET_FACTOR: f64 = 1.0;

/// Step reported when no profile data applies.
pub const DEFAULT_STEP: u32 = 1;

/// Heater temperature reported when no profile data applies (°C).
pub const DEFAULT_TEMPERATURE_C: f64 = 0.0;

/// Index given to the first cycle seen for a tracker key.
pub const FIRST_CYCLE_INDEX: u32 = 1;
