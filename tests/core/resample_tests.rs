//! Tests for deduplication and forward-fill resampling
//!
//! Tests cover:
//! - Dedup policies on repeated timestamps
//! - Identity on already-regular series
//! - Forward fill between samples and nothing before the first one
//! - Shared grid across sensors and the per-sensor tick limit

use obdplot::error::ReshapeError;
use obdplot::parsers::{ObdCsv, Parseable};
use obdplot::resample::{
    resample, reshape, DedupPolicy, ReshapeOptions, SensorSeries, MAX_TICKS,
};

use crate::common::{assert_close, assert_column, obd_csv, row};

fn series(samples: &[(f64, f64)], policy: DedupPolicy) -> SensorSeries {
    SensorSeries::from_samples(samples.iter().copied(), policy)
}

// ============================================
// Deduplication Tests
// ============================================

#[test]
fn test_dedup_first_and_last() {
    let samples = [(2.0, 9.0), (0.0, 5.0), (0.0, 7.0)];

    let first = series(&samples, DedupPolicy::First);
    assert_eq!(first.times, vec![0.0, 2.0]);
    assert_eq!(first.values, vec![5.0, 9.0]);

    let last = series(&samples, DedupPolicy::Last);
    assert_eq!(last.values, vec![7.0, 9.0]);
}

#[test]
fn test_dedup_policy_parses() {
    assert_eq!("last".parse::<DedupPolicy>().unwrap(), DedupPolicy::Last);
    assert_eq!(DedupPolicy::default(), DedupPolicy::First);
    assert!("middle".parse::<DedupPolicy>().is_err());
}

// ============================================
// Resampling Tests
// ============================================

#[test]
fn test_worked_example() {
    let csv = obd_csv(
        ';',
        &[row("A", 10.0, 5.0, "u"), row("A", 10.0, 7.0, "u"), row("A", 12.0, 9.0, "u")],
    );
    let mut table = ObdCsv::new(b';').parse(&csv).unwrap();
    table.normalize_times();
    let seconds: Vec<f64> = table.records.iter().map(|r| r.seconds).collect();
    assert_eq!(seconds, vec![0.0, 0.0, 2.0]);

    let wide = reshape(&table, &ReshapeOptions::default()).unwrap();
    assert_eq!(wide.times, vec![0.0, 1.0, 2.0]);
    assert_column(
        &wide.channel("A").unwrap().values,
        &[Some(5.0), Some(5.0), Some(9.0)],
    );
}

#[test]
fn test_regular_series_is_identity() {
    let samples: Vec<(f64, f64)> = (0..20).map(|i| (i as f64, (i * i) as f64)).collect();
    let resampled = resample("A", &series(&samples, DedupPolicy::First), 1.0)
        .unwrap()
        .unwrap();

    let expected: Vec<Option<f64>> = samples.iter().map(|s| Some(s.1)).collect();
    assert_eq!(resampled.values, expected);
    let times: Vec<f64> = resampled.times().collect();
    assert_eq!(times, (0..20).map(|i| i as f64).collect::<Vec<_>>());
}

#[test]
fn test_forward_fill_between_samples() {
    let resampled = resample("A", &series(&[(0.0, 1.5), (4.0, 8.0)], DedupPolicy::First), 1.0)
        .unwrap()
        .unwrap();
    assert_column(
        &resampled.values,
        &[Some(1.5), Some(1.5), Some(1.5), Some(1.5), Some(8.0)],
    );
}

#[test]
fn test_grid_counts_from_zero() {
    let resampled = resample("A", &series(&[(2.5, 1.0), (5.0, 2.0)], DedupPolicy::First), 1.0)
        .unwrap()
        .unwrap();

    assert_close(resampled.start, 2.0);
    // Ticks 2, 3, 4, 5; the tick before the first sample stays empty
    assert_eq!(resampled.len(), 4);
    assert_column(&resampled.values, &[None, Some(1.0), Some(1.0), Some(2.0)]);
}

#[test]
fn test_offset_sensors_share_ticks() {
    let speed = series(&[(0.1, 10.0), (1.1, 11.0), (2.1, 12.0)], DedupPolicy::First);
    let rpm = series(&[(0.7, 800.0), (1.7, 900.0), (2.7, 950.0)], DedupPolicy::First);
    let speed = resample("speed", &speed, 1.0).unwrap().unwrap();
    let rpm = resample("rpm", &rpm, 1.0).unwrap().unwrap();

    assert_eq!(speed.times().collect::<Vec<_>>(), rpm.times().collect::<Vec<_>>());
    assert_column(&rpm.values, &[None, Some(800.0), Some(900.0)]);
}

#[test]
fn test_stray_epoch_zero_is_reshape_error() {
    let csv = obd_csv(
        ';',
        &[row("A", 1_694_430_000.0, 5.0, "u"), row("A", 0.0, 7.0, "u")],
    );
    let mut table = ObdCsv::new(b';').parse(&csv).unwrap();
    table.normalize_times();

    match reshape(&table, &ReshapeOptions::default()) {
        Err(ReshapeError::TooManyTicks { sensor, limit, .. }) => {
            assert_eq!(sensor, "A");
            assert_eq!(limit, MAX_TICKS);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_half_second_interval() {
    let resampled = resample("A", &series(&[(0.0, 1.0), (1.0, 2.0)], DedupPolicy::First), 0.5)
        .unwrap()
        .unwrap();
    assert_column(&resampled.values, &[Some(1.0), Some(1.0), Some(2.0)]);
}

#[test]
fn test_empty_series() {
    assert!(resample("A", &SensorSeries::default(), 1.0).unwrap().is_none());
}

#[test]
fn test_invalid_interval() {
    let s = series(&[(0.0, 1.0)], DedupPolicy::First);
    for interval in [0.0, -1.0, f64::NAN] {
        assert!(matches!(
            resample("A", &s, interval),
            Err(ReshapeError::InvalidInterval(_))
        ));
    }
}
