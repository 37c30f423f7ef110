//! Reading stream generators

use knose_core::Reading;

use super::t;

/// Deterministic linear congruential jitter source
pub struct Jitter {
    state: u64,
}

impl Jitter {
    /// Seeded source
    pub fn new(seed: u64) -> Self {
        Self { state: seed.wrapping_mul(6364136223846793005).wrapping_add(1) }
    }

    /// Next value in `[0, 1)`
    pub fn next_unit(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.state >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Stream generator for one sensor on one profile label
pub struct ReadingStream {
    device_id: String,
    sensor_id: String,
    label: String,
}

impl ReadingStream {
    /// Generator for `device/sensor/label`
    pub fn new(device_id: &str, sensor_id: &str, label: &str) -> Self {
        Self {
            device_id: device_id.into(),
            sensor_id: sensor_id.into(),
            label: label.into(),
        }
    }

    /// One reading `secs` after the test epoch
    pub fn at(&self, secs: f64) -> Reading {
        Reading::at(&self.device_id, &self.sensor_id, &self.label, t(secs))
    }

    /// Readings at each offset
    pub fn at_offsets(&self, offsets: &[f64]) -> Vec<Reading> {
        offsets.iter().map(|secs| self.at(*secs)).collect()
    }

    /// `count` readings starting at `start`, spaced `period` apart
    pub fn regular(&self, start: f64, period: f64, count: usize) -> Vec<Reading> {
        (0..count).map(|i| self.at(start + period * i as f64)).collect()
    }

    /// Regular cadence with up to `max_jitter` seconds of extra delay per sample
    pub fn jittered(&self, start: f64, period: f64, max_jitter: f64, count: usize, seed: u64) -> Vec<Reading> {
        let mut jitter = Jitter::new(seed);
        (0..count)
            .map(|i| self.at(start + period * i as f64 + max_jitter * jitter.next_unit()))
            .collect()
    }
}
