//! Time-Related Constants
//!
//! Layout of realtime-store timestamp keys, e.g. `2026-02-02_09-38-35_398398000`.

/// Nanoseconds in one second.
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Same as [`NANOS_PER_SECOND`], for floating point arithmetic.
pub const NANOS_PER_SECOND_F64: f64 = 1_000_000_000.0;

/// Separator between the date, time and fraction segments of a key.
pub const KEY_SEGMENT_SEPARATOR: char = '_';

/// Separator between the numeric fields of the date and time segments.
pub const KEY_FIELD_SEPARATOR: char = '-';

/// Digits of sub-second precision kept from the fraction segment.
///
/// The store writes nanoseconds; anything beyond nine digits is truncated.
pub const FRACTION_DIGITS: usize = 9;

/// Minimum number of `_`-separated segments in a valid key (date and time).
pub const MIN_KEY_SEGMENTS: usize = 2;

/// Maximum number of `_`-separated segments in a valid key (date, time, fraction).
pub const MAX_KEY_SEGMENTS: usize = 3;
