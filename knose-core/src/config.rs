//! Classifier configuration

use crate::constants::cycle::{GAP_RESET_FACTOR, MIN_GAP_RESET_FACTOR};

/// Tunables for cycle tracking
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassifierConfig {
    /// Silence, in multiples of the profile duration, that starts a new session
    pub gap_reset_factor: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            gap_reset_factor: GAP_RESET_FACTOR,
        }
    }
}

impl ClassifierConfig {
    /// Set the gap reset factor
    ///
    /// Values below one cycle are raised to one; non-finite values keep the
    /// default.
    pub fn with_gap_reset_factor(mut self, factor: f64) -> Self {
        self.gap_reset_factor = if factor.is_finite() {
            factor.max(MIN_GAP_RESET_FACTOR)
        } else {
            GAP_RESET_FACTOR
        };
        self
    }

    /// Largest silence (seconds) that still continues the current session
    pub fn max_session_gap_s(&self, total_duration_s: f64) -> f64 {
        self.gap_reset_factor * total_duration_s
    }
}
