//! Shared fixtures for knose-core integration tests
//!
//! - `generators`: reading streams with controllable cadence and jitter
//! - `scenarios`: named profile catalogs and reading sets

#![allow(dead_code)]

pub mod generators;
pub mod scenarios;

use knose_core::Timestamp;

/// Arbitrary fixed epoch for test streams (2026-02-02 09:38:35 UTC)
pub const T0_SECS: f64 = 1_770_025_115.0;

/// Instant `secs` after [`T0_SECS`]
pub fn t(secs: f64) -> Timestamp {
    Timestamp::from_secs_f64(T0_SECS + secs)
}

/// Assert two floats agree to within a microsecond
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
