//! Timestamps for store readings
//!
//! Readings are keyed in the realtime store by a string of the form
//! `YYYY-MM-DD_HH-MM-SS[_<fraction digits>]`, interpreted as UTC. This module
//! turns those keys into an ordered [`Timestamp`] with nanosecond resolution
//! and provides the little arithmetic the cycle tracker needs.
//!
//! A key that cannot be parsed maps to [`Timestamp::EARLIEST`], a sentinel
//! that sorts before every real instant so the reading is retained but never
//! mistaken for valid data.

use core::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike};

use alloc::string::ToString;
use alloc::vec::Vec;

use crate::constants::time::{
    FRACTION_DIGITS, KEY_FIELD_SEPARATOR, KEY_SEGMENT_SEPARATOR, MAX_KEY_SEGMENTS,
    MIN_KEY_SEGMENTS, NANOS_PER_SECOND, NANOS_PER_SECOND_F64,
};
use crate::errors::{ClassificationError, ClassificationResult};

/// Instant in nanoseconds since the Unix epoch (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(i64);

impl Timestamp {
    /// Sentinel for readings whose key could not be parsed
    pub const EARLIEST: Self = Self(i64::MIN);

    /// Create from nanoseconds since the epoch
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Create from (possibly fractional) seconds since the epoch
    pub fn from_secs_f64(secs: f64) -> Self {
        Self(libm::round(secs * NANOS_PER_SECOND_F64) as i64)
    }

    /// Nanoseconds since the epoch
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Seconds since the epoch
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SECOND_F64
    }

    /// True for [`Timestamp::EARLIEST`]
    pub const fn is_sentinel(self) -> bool {
        self.0 == i64::MIN
    }

    /// Signed seconds from `earlier` to `self`
    pub fn seconds_since(self, earlier: Timestamp) -> f64 {
        self.0.saturating_sub(earlier.0) as f64 / NANOS_PER_SECOND_F64
    }

    /// This instant moved forward by `secs` seconds
    pub fn advanced_by_secs(self, secs: f64) -> Self {
        let delta = libm::round(secs * NANOS_PER_SECOND_F64) as i64;
        Self(self.0.saturating_add(delta))
    }

    /// Parse a store key such as `2026-02-02_09-38-35_398398000`
    ///
    /// The optional third segment holds the decimal fraction of the second:
    /// `_5` is half a second, `_398398000` is 0.398398 s. Digits past the
    /// ninth are dropped.
    pub fn parse_key(key: &str) -> ClassificationResult<Self> {
        parse_key_parts(key).ok_or_else(|| ClassificationError::MalformedTimestamp {
            raw: key.to_string(),
        })
    }

    /// Parse a store key, substituting [`Timestamp::EARLIEST`] when malformed
    pub fn parse_key_or_earliest(key: &str) -> Self {
        match Self::parse_key(key) {
            Ok(ts) => ts,
            Err(_) => {
                log_debug!("Malformed timestamp key {:?}, using earliest sentinel", key);
                Self::EARLIEST
            }
        }
    }
}

impl fmt::Display for Timestamp {
    /// Renders in store key layout with a nine digit fraction
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sentinel() {
            return f.write_str("<earliest>");
        }

        let secs = self.0.div_euclid(NANOS_PER_SECOND);
        let nanos = self.0.rem_euclid(NANOS_PER_SECOND) as u32;
        match DateTime::from_timestamp(secs, nanos) {
            Some(dt) => {
                let dt = dt.naive_utc();
                write!(
                    f,
                    "{:04}-{:02}-{:02}_{:02}-{:02}-{:02}_{:09}",
                    dt.year(),
                    dt.month(),
                    dt.day(),
                    dt.hour(),
                    dt.minute(),
                    dt.second(),
                    nanos,
                )
            }
            None => write!(f, "{}ns", self.0),
        }
    }
}

fn parse_key_parts(key: &str) -> Option<Timestamp> {
    let segments = split_key(key)?;

    let [year, month, day] = parse_fields(segments.date)?;
    let [hour, minute, second] = parse_fields(segments.time)?;

    let date = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;
    let whole_secs = date.and_time(time).and_utc().timestamp();

    let fraction = match segments.fraction {
        Some(digits) => parse_fraction(digits)?,
        None => 0,
    };

    whole_secs
        .checked_mul(NANOS_PER_SECOND)?
        .checked_add(fraction)
        .map(Timestamp)
}

/// Exactly three `-`-separated all-digit fields
fn parse_fields(segment: &str) -> Option<[u32; 3]> {
    let mut fields = segment.split(KEY_FIELD_SEPARATOR);
    let mut out = [0u32; 3];
    for slot in out.iter_mut() {
        *slot = parse_digits(fields.next()?)?;
    }
    if fields.next().is_some() {
        return None;
    }
    Some(out)
}

fn parse_digits(field: &str) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Decimal fraction of a second, in nanoseconds
fn parse_fraction(digits: &str) -> Option<i64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut nanos: i64 = 0;
    let mut taken = 0;
    for b in digits.bytes().take(FRACTION_DIGITS) {
        nanos = nanos * 10 + i64::from(b - b'0');
        taken += 1;
    }
    for _ in taken..FRACTION_DIGITS {
        nanos *= 10;
    }
    Some(nanos)
}

struct KeySegments<'a> {
    date: &'a str,
    time: &'a str,
    fraction: Option<&'a str>,
}

fn split_key(key: &str) -> Option<KeySegments<'_>> {
    let parts: Vec<&str> = key.trim().split(KEY_SEGMENT_SEPARATOR).collect();
    if !(MIN_KEY_SEGMENTS..=MAX_KEY_SEGMENTS).contains(&parts.len()) {
        return None;
    }
    Some(KeySegments {
        date: parts[0],
        time: parts[1],
        fraction: parts.get(2).copied(),
    })
}
