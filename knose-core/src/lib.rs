//! Heater-profile cycle and step classification engine for knose
//!
//! Every sensor in the array repeats one of a small set of heater duty cycles
//! ("heater profiles"). Given only the wall-clock timestamp of a reading, this
//! crate works out which phase of the duty cycle produced it: the sequential
//! step, the nominal heater temperature for that step, which repetition of the
//! profile is running, and whether the authored profile has a numbering gap.
//!
//! Key constraints:
//! - No I/O inside the engine, readings arrive already materialized
//! - One bad reading never aborts a batch
//! - Profile data is immutable after startup and freely shared
//!
//! ```no_run
//! use std::sync::Arc;
//! use knose_core::{BatchClassifier, ProfileRegistry, Reading};
//!
//! let registry = Arc::new(ProfileRegistry::with_default_catalog()?);
//! let mut classifier = BatchClassifier::new(registry);
//!
//! let output = classifier.classify_batch(vec![
//!     Reading::new("Device_1", "BME_01", "Hp_301", "2026-02-02_09-38-35_398398000"),
//!     Reading::new("Device_1", "BME_01", "Hp_301", "2026-02-02_09-38-41_401000000"),
//! ]);
//!
//! for record in &output.records {
//!     println!("step {} at {}°C", record.step, record.target_temperature_c);
//! }
//! # Ok::<(), knose_core::ClassificationError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod batch;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
#[cfg(feature = "std")]
pub mod live;
pub mod normalize;
pub mod profile;
pub mod reading;
pub mod registry;
pub mod report;
pub mod time;
pub mod tracker;

// Public API
pub use batch::{sort_readings, BatchClassifier, BatchOutput};
pub use classifier::{classify, StepClassification};
pub use config::ClassifierConfig;
pub use errors::{ClassificationError, ClassificationResult};
pub use events::{ClassificationEvent, RecordIssue};
#[cfg(feature = "std")]
pub use live::LiveClassifier;
pub use normalize::{normalize, NormalizedStepEntry, NormalizedStepMap, StepMapCache};
pub use profile::{HeaterProfile, ProfileId, StaticProfile, TimeStepEntry};
pub use reading::{ClassifiedRecord, FieldValue, Reading};
pub use registry::{canonical_label, parse_profile_label, ProfileRegistry};
pub use report::{ClassificationReport, GroupKey, GroupReport};
pub use time::Timestamp;
pub use tracker::{CycleState, CycleTracker, CycleTrackers, CycleTransition, CycleUpdate, SensorKey, TrackerKey};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
