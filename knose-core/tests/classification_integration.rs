//! End-to-end classification through the public API

mod common;

use knose_core::{
    classify, BatchClassifier, ClassificationEvent, ClassifierConfig, CycleTransition, LiveClassifier,
    Reading, RecordIssue, StepMapCache,
};
use std::sync::Arc;

use common::generators::ReadingStream;
use common::scenarios::{
    default_registry, mixed_registry, HP301_DURATION_S, HP301_OFFSETS, HP301_TEMPERATURES,
};
use common::{assert_close, t};

#[test]
fn hp301_breakpoints_map_to_steps_one_through_ten() {
    let registry = default_registry();
    let cache = StepMapCache::warm(&registry);
    let map = cache.get(301).unwrap();
    assert_eq!(map.step_count(), 10);
    assert!(!map.has_gaps());

    for (index, (offset, temperature)) in HP301_OFFSETS.iter().zip(HP301_TEMPERATURES).enumerate() {
        let result = classify(map.entries(), *offset);
        assert_eq!(result.step, index as u32 + 1, "offset {offset}");
        assert_eq!(result.temperature_c, temperature, "offset {offset}");
        assert!(!result.is_anomaly);
    }
}

#[test]
fn hp301_tracked_stream_wraps_into_cycle_two() {
    let stream = ReadingStream::new("Device_1", "BME_01", "Hp_301");
    let mut classifier = BatchClassifier::new(default_registry());
    let output = classifier.classify_batch(stream.at_offsets(&HP301_OFFSETS));

    let steps: Vec<u32> = output.records.iter().map(|r| r.step).collect();
    assert_eq!(steps, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 1]);

    let wrapped = &output.records[9];
    assert_eq!(wrapped.cycle_index, 2);
    assert_eq!(wrapped.elapsed_in_cycle_s, 0.0);
    assert_eq!(wrapped.target_temperature_c, 100.0);
    assert!(output.records[..9].iter().all(|r| r.cycle_index == 1));
}

#[test]
fn unknown_label_is_isolated() {
    let known = ReadingStream::new("Device_1", "BME_01", "Hp_301");
    let unknown = ReadingStream::new("Device_1", "BME_02", "HP_999");

    let mut readings = known.regular(0.0, 1.0, 18);
    readings.extend(unknown.regular(0.5, 1.0, 3));

    let mut classifier = BatchClassifier::new(default_registry());
    let output = classifier.classify_batch(readings);

    let bad: Vec<_> = output.records.iter().filter(|r| r.reading.profile_label == "HP_999").collect();
    assert_eq!(bad.len(), 3);
    for record in &bad {
        assert_eq!((record.step, record.target_temperature_c, record.is_anomaly), (1, 0.0, false));
        assert_eq!(record.issue, Some(RecordIssue::UnknownProfile));
    }

    let good: Vec<u32> = output
        .records
        .iter()
        .filter(|r| r.reading.sensor_id == "BME_01")
        .map(|r| r.step)
        .collect();
    assert_eq!(good, vec![1, 1, 1, 1, 1, 1, 2, 3, 3, 4, 4, 5, 6, 7, 7, 8, 8, 9]);

    let unknown_events = output
        .events
        .iter()
        .filter(|e| matches!(e, ClassificationEvent::UnknownProfile { .. }))
        .count();
    assert_eq!(unknown_events, 3);
    assert_eq!(output.report.get("BME_02", "HP_999").unwrap().unknown_profile_count, 3);
}

#[test]
fn malformed_keys_are_retained() {
    let stream = ReadingStream::new("Device_1", "BME_01", "Hp_301");
    let mut readings = stream.regular(0.0, 3.0, 4);
    readings.push(Reading::new("Device_1", "BME_01", "Hp_301", "2026-02-30_10-00-00"));
    readings.push(Reading::new("Device_1", "BME_01", "Hp_301", "2026-02-02"));

    let mut classifier = BatchClassifier::new(default_registry());
    let output = classifier.classify_batch(readings);

    assert_eq!(output.records.len(), 6);
    assert!(output.records[..2]
        .iter()
        .all(|r| r.issue == Some(RecordIssue::MalformedTimestamp) && r.cycle_index == 1));
    assert!(output.records[2..].iter().all(|r| r.issue.is_none()));

    let group = output.report.get("BME_01", "HP_301").unwrap();
    assert_eq!(group.malformed_timestamp_count, 2);
    assert_eq!(group.record_count, 6);

    let mut logged: Vec<&str> = output
        .events
        .iter()
        .filter_map(|event| match event {
            ClassificationEvent::MalformedTimestamp { raw_timestamp, .. } => Some(raw_timestamp.as_str()),
            _ => None,
        })
        .collect();
    logged.sort_unstable();
    assert_eq!(logged, vec!["2026-02-02", "2026-02-30_10-00-00"]);
    assert_eq!(output.events.len(), 2);
}

#[test]
fn gapped_profile_flags_absorbing_steps() {
    let stream = ReadingStream::new("Device_7", "BME_03", "hp_900");
    let mut classifier = BatchClassifier::new(mixed_registry());
    let output = classifier.classify_batch(stream.regular(0.0, 2.0, 5));

    let flagged: Vec<(u32, bool)> = output.records.iter().map(|r| (r.step, r.is_anomaly)).collect();
    assert_eq!(flagged, vec![(1, false), (2, false), (3, true), (4, false), (5, true)]);

    let group = output.report.get("BME_03", "HP_900").unwrap();
    assert_eq!(group.anomaly_count, 2);
    assert_eq!(group.missing_authored_steps, vec![3, 6, 7]);
    assert!(group.is_complete());
}

#[test]
fn sampling_jitter_does_not_drift_the_phase() {
    // 90 cycles of 1 Hz sampling, each sample up to 0.4 s late
    let stream = ReadingStream::new("Device_1", "BME_01", "Hp_301");
    let mut classifier = BatchClassifier::new(default_registry());
    let output = classifier.classify_batch(stream.jittered(0.0, 1.0, 0.4, 1620, 7));

    let key = output.records[0].reading.tracker_key();
    let state = classifier.trackers().state(&key).unwrap();
    // the first sample is late too, and it is the phase anchor
    let first = output.records[0].reading.timestamp;
    assert!(first > t(0.0));
    let anchor_offset = state.cycle_start.seconds_since(first);
    assert_close(anchor_offset % HP301_DURATION_S, 0.0);
    assert_eq!(state.cycle_index, 90);
    assert!(output.events.is_empty());
}

#[test]
fn long_silence_starts_a_new_session() {
    let stream = ReadingStream::new("Device_1", "BME_01", "Hp_301");
    let mut classifier = BatchClassifier::new(default_registry());
    let output = classifier.classify_batch(vec![stream.at(0.0), stream.at(5.0), stream.at(5.0 + 28.8)]);

    let resumed = &output.records[2];
    assert_eq!(resumed.elapsed_in_cycle_s, 0.0);
    assert_eq!(resumed.step, 1);
    assert_eq!(resumed.cycle_index, 2);
    assert!(matches!(
        output.events[..],
        [ClassificationEvent::CycleReset { transition: CycleTransition::GapReset, .. }]
    ));
}

#[test]
fn profile_switch_resets_the_sensor() {
    let hp301 = ReadingStream::new("Device_1", "BME_01", "Hp_301");
    let hp900 = ReadingStream::new("Device_1", "BME_01", "HP_900");
    let mut classifier = BatchClassifier::new(mixed_registry());

    let output = classifier.classify_batch(vec![
        hp301.at(0.0),
        hp301.at(4.0),
        hp900.at(5.0),
        hp900.at(7.0),
        hp301.at(8.0),
    ]);
    assert_eq!(output.records[3].step, 2);
    let back = &output.records[4];
    assert_eq!(back.elapsed_in_cycle_s, 0.0);
    assert_eq!(back.cycle_index, 2);
}

#[test]
fn live_and_batch_agree() {
    let registry = default_registry();
    let step_maps = Arc::new(StepMapCache::warm(&registry));
    let stream = ReadingStream::new("Device_2", "BME_05", "HP301");
    let readings = stream.jittered(0.0, 1.3, 0.2, 200, 11);

    let mut batch = BatchClassifier::with_shared(Arc::clone(&registry), Arc::clone(&step_maps), ClassifierConfig::default());
    let live = LiveClassifier::new(registry, step_maps, ClassifierConfig::default());

    let expected = batch.classify_batch(readings.clone()).records;
    let actual: Vec<_> = readings.into_iter().map(|r| live.on_reading(r)).collect();
    assert_eq!(expected, actual);
}
