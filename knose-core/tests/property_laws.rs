//! Property tests for normalization and cycle tracking

mod common;

use knose_core::{classify, normalize, CycleTracker, HeaterProfile, TimeStepEntry};
use proptest::prelude::*;

use common::t;

fn authored_profile() -> impl Strategy<Value = HeaterProfile> {
    (
        1.0f64..120.0,
        prop::collection::vec((0.0f64..1.0, -5i32..40, 50.0f64..400.0), 0..16),
    )
        .prop_map(|(duration, raw)| {
            let entries = raw
                .into_iter()
                .map(|(fraction, step, temperature)| TimeStepEntry::new(fraction * duration, step, temperature))
                .collect();
            HeaterProfile::new(1, duration, entries).unwrap()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn sequential_steps_are_contiguous(profile in authored_profile()) {
        let map = normalize(&profile);
        let steps: Vec<u32> = map.entries().iter().map(|e| e.sequential_step).collect();
        let expected: Vec<u32> = (1..=profile.time_step_map().len() as u32).collect();
        prop_assert_eq!(steps, expected);
        prop_assert!(map.entries().windows(2).all(|w| w[0].time_offset_s <= w[1].time_offset_s));
    }

    #[test]
    fn anomaly_flag_follows_missing_steps(profile in authored_profile()) {
        let map = normalize(&profile);
        let missing = map.missing_authored_steps();
        for entry in map.entries() {
            let follows_gap = missing.contains(&(entry.authored_step - 1));
            prop_assert_eq!(entry.is_anomaly, follows_gap);
        }
        prop_assert_eq!(normalize(&profile), map);
    }

    #[test]
    fn classification_is_periodic(profile in authored_profile(), phase in 0.0f64..1.0, cycles in 1u32..50) {
        let map = normalize(&profile);
        let duration = profile.total_duration_s();
        let elapsed = phase * duration;

        let mut tracker = CycleTracker::start(t(0.0));
        let mut update = tracker.observe(t(elapsed), duration, 1.5, false);
        // one sample per cycle keeps every gap under the session limit
        for k in 1..=cycles {
            update = tracker.observe(t(f64::from(k) * duration + elapsed), duration, 1.5, false);
        }

        prop_assert!(update.elapsed_in_cycle_s >= 0.0 && update.elapsed_in_cycle_s < duration);
        let direct = classify(map.entries(), elapsed);
        let tracked = classify(map.entries(), update.elapsed_in_cycle_s);
        // clock rounding may move a sample sitting on a breakpoint or the cycle edge
        let on_breakpoint = map
            .entries()
            .iter()
            .any(|e| (e.time_offset_s - elapsed).abs() < 1e-6);
        let on_edge = elapsed < 1e-6 || duration - elapsed < 1e-6;
        if !on_edge {
            prop_assert_eq!(update.cycle_index, cycles + 1);
        }
        if !on_breakpoint && !on_edge {
            prop_assert_eq!(direct, tracked);
        }
    }

    #[test]
    fn elapsed_always_in_range(
        duration in 0.5f64..60.0,
        deltas in prop::collection::vec(0.0f64..100.0, 1..64),
    ) {
        let mut tracker = CycleTracker::start(t(0.0));
        let mut now = 0.0;
        for delta in deltas {
            now += delta;
            let update = tracker.observe(t(now), duration, 1.5, false);
            prop_assert!(update.elapsed_in_cycle_s >= 0.0);
            prop_assert!(update.elapsed_in_cycle_s < duration);
            prop_assert!(update.cycle_index >= 1);
        }
    }
}
