//! Constants for knose Core
//!
//! Centralized numeric values used by the classification engine. Each value
//! is documented with its unit and where it comes from.
//!
//! ## Organization
//!
//! - **Cycle**: cycle-boundary detection and fallback classification
//! - **Time**: timestamp key layout and unit conversion
//! - **Profiles**: the bundled heater-profile catalog

/// Cycle-boundary detection and fallback classification values.
pub mod cycle;

/// Timestamp key layout and unit conversion.
pub mod time;

/// Bundled heater-profile definitions.
pub mod profiles;

pub use cycle::{DEFAULT_STEP, DEFAULT_TEMPERATURE_C, FIRST_CYCLE_INDEX, GAP_RESET_FACTOR};
pub use profiles::{DEFAULT_CATALOG, HP_301};
pub use time::{FRACTION_DIGITS, NANOS_PER_SECOND};
