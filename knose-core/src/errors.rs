//! Error Types for Classification Failures
//!
//! ## Recovery Model
//!
//! Nothing in this module is fatal to a batch. The engine favors availability:
//! a reading that cannot be classified is still emitted, carrying the default
//! classification (step 1, 0°C, no anomaly) and a [`RecordIssue`] tag, and the
//! failure is recorded as a [`ClassificationEvent`] for the report layer.
//!
//! | Error                | Raised by                 | Recovery                          |
//! |----------------------|---------------------------|-----------------------------------|
//! | `UnknownProfile`     | `ProfileRegistry::resolve`| default classification, continue  |
//! | `MalformedTimestamp` | `Timestamp::parse_key`    | sentinel earliest instant         |
//! | `EmptyTimeStepMap`   | `StepMapCache::breakpoints`| default classification           |
//! | `InvalidProfile`     | catalog construction      | catalog rejected at startup       |
//! | `DuplicateProfile`   | catalog construction      | catalog rejected at startup       |
//!
//! Only the last two can surface to a caller, and only while the catalog is
//! being built, before any reading has been seen.
//!
//! ```rust
//! use knose_core::{ClassificationError, ProfileRegistry};
//!
//! let registry = ProfileRegistry::with_default_catalog()?;
//! match registry.resolve("HP_999") {
//!     Ok(profile) => println!("duration {}s", profile.total_duration_s()),
//!     Err(ClassificationError::UnknownProfile { label }) => {
//!         // substitute the default classification and keep going
//!         println!("unknown profile label {label}");
//!     }
//!     Err(other) => println!("unexpected: {other}"),
//! }
//! # Ok::<(), ClassificationError>(())
//! ```
//!
//! [`RecordIssue`]: crate::events::RecordIssue
//! [`ClassificationEvent`]: crate::events::ClassificationEvent

use alloc::string::String;

use thiserror_no_std::Error;

use crate::profile::ProfileId;

/// Result type for classification operations
pub type ClassificationResult<T> = Result<T, ClassificationError>;

/// Classification errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassificationError {
    /// Label does not name a catalogued heater profile
    #[error("Unknown heater profile label: {label}")]
    UnknownProfile {
        /// The raw label as it appeared in the store
        label: String,
    },

    /// Timestamp key does not follow `YYYY-MM-DD_HH-MM-SS[_fraction]`
    #[error("Malformed timestamp key: {raw}")]
    MalformedTimestamp {
        /// The raw key as it appeared in the store
        raw: String,
    },

    /// Profile is known but has no authored steps
    #[error("Heater profile {profile_id} has an empty time-step map")]
    EmptyTimeStepMap {
        /// Profile with the empty map
        profile_id: ProfileId,
    },

    /// Profile definition violates a catalog invariant
    #[error("Invalid heater profile {profile_id}: {reason}")]
    InvalidProfile {
        /// Offending profile
        profile_id: ProfileId,
        /// What was wrong with it
        reason: &'static str,
    },

    /// The same profile id was supplied twice to one catalog
    #[error("Heater profile {profile_id} registered twice")]
    DuplicateProfile {
        /// Id that collided
        profile_id: ProfileId,
    },
}
