//! Tests for wide-table joins, GPS attachment and the dataset

use std::path::PathBuf;

use obdplot::parsers::{ObdCsv, Parseable};
use obdplot::resample::{reshape, ReshapeOptions};
use obdplot::state::{Dataset, LoadedFile};
use obdplot::table::{GpsStatus, LATITUDE_COLUMN, LONGITUDE_COLUMN};

use crate::common::{
    assert_column, drive_rows, gps_row, obd_csv, obd_csv_with_gps, row, FUEL, RPM, SPEED,
};

fn wide_from(csv: &str) -> obdplot::table::WideTable {
    let mut table = ObdCsv::new(b';').parse(csv).unwrap();
    table.normalize_times();
    reshape(&table, &ReshapeOptions::default()).unwrap()
}

// ============================================
// Join Tests
// ============================================

#[test]
fn test_column_set_matches_sensors() {
    let wide = wide_from(&obd_csv(';', &drive_rows(100.0, 5)));
    assert_eq!(wide.column_names().collect::<Vec<_>>(), vec![SPEED, FUEL, RPM]);
    assert_eq!(wide.gps, GpsStatus::NoCoordinateColumns);
}

#[test]
fn test_offset_sensors_share_rows() {
    // Speed samples at 0.0, 1.0; fuel at 0.5, 1.5
    let csv = obd_csv(
        ';',
        &[
            row(SPEED, 0.0, 10.0, "km/h"),
            row(FUEL, 0.5, 6.0, "l/100km"),
            row(SPEED, 1.0, 20.0, "km/h"),
            row(FUEL, 1.5, 7.0, "l/100km"),
        ],
    );
    let wide = wide_from(&csv);

    assert_eq!(wide.times, vec![0.0, 1.0]);
    assert_column(&wide.channel(SPEED).unwrap().values, &[Some(10.0), Some(20.0)]);
    // Nothing known at 0; the sample at 1.5 lies past the last tick
    assert_column(&wide.channel(FUEL).unwrap().values, &[None, Some(6.0)]);
    assert_eq!(wide.paired(SPEED, FUEL).unwrap(), vec![(20.0, 6.0)]);
}

#[test]
fn test_outer_join_keeps_uneven_coverage() {
    let csv = obd_csv(
        ';',
        &[
            row(SPEED, 0.0, 10.0, "km/h"),
            row(SPEED, 3.0, 40.0, "km/h"),
            row(FUEL, 1.2, 6.0, "l/100km"),
            row(FUEL, 2.4, 7.0, "l/100km"),
        ],
    );
    let wide = wide_from(&csv);

    assert_eq!(wide.times, vec![0.0, 1.0, 2.0, 3.0]);
    assert_column(
        &wide.channel(FUEL).unwrap().values,
        &[None, None, Some(6.0), None],
    );
    assert_eq!(wide.paired(SPEED, FUEL).unwrap(), vec![(10.0, 6.0)]);
}

#[test]
fn test_drive_pairs_every_whole_second() {
    let wide = wide_from(&obd_csv(';', &drive_rows(0.0, 10)));

    assert_eq!(wide.row_count(), 10);
    // Speed defines time zero; fuel is first known one tick later
    let pairs = wide.paired(SPEED, FUEL).unwrap();
    assert_eq!(pairs.len(), 9);
    assert_eq!(pairs[0], (21.0, 6.0));
    assert_eq!(wide.paired(FUEL, RPM).unwrap().len(), 9);
}

#[test]
fn test_missing_channel_is_explicit() {
    let wide = wide_from(&obd_csv(';', &drive_rows(0.0, 2)));
    let err = wide.channel("Transmission Temperature (var.2)").unwrap_err();
    assert_eq!(err.channel, "Transmission Temperature (var.2)");
    assert!(!wide.has_channel("Transmission Temperature (var.2)"));
}

// ============================================
// GPS Attachment Tests
// ============================================

#[test]
fn test_gps_attached_on_sensor_grid() {
    let wide = wide_from(&obd_csv_with_gps(';', &drive_rows(0.0, 4)));

    assert!(wide.gps.is_attached());
    let names: Vec<_> = wide.column_names().collect();
    assert!(names.contains(&LATITUDE_COLUMN));
    assert!(names.contains(&LONGITUDE_COLUMN));

    let speed_rows: Vec<usize> = wide
        .channel(SPEED)
        .unwrap()
        .values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|_| i))
        .collect();
    let lat_rows: Vec<usize> = wide
        .channel(LATITUDE_COLUMN)
        .unwrap()
        .values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|_| i))
        .collect();
    assert_eq!(speed_rows, lat_rows);
    assert_eq!(wide.geo_points(SPEED).unwrap().len(), 4);
}

#[test]
fn test_gps_sensor_missing() {
    let csv = obd_csv_with_gps(';', &[row(RPM, 0.0, 800.0, "rpm"), row(RPM, 1.0, 900.0, "rpm")]);
    let wide = wide_from(&csv);
    assert!(matches!(wide.gps, GpsStatus::SensorMissing { .. }));
    assert!(!wide.has_channel(LATITUDE_COLUMN));
    assert!(wide.gps.to_string().contains("no GPS data available"));
}

#[test]
fn test_gps_coordinates_start_late() {
    let csv = obd_csv_with_gps(
        ';',
        &[
            row(SPEED, 0.0, 10.0, "km/h"),
            row(SPEED, 1.0, 11.0, "km/h"),
            gps_row(SPEED, 2.0, 12.0, 48.5, 11.5),
        ],
    );
    let wide = wide_from(&csv);
    assert!(wide.gps.is_attached());
    assert_column(
        &wide.channel(LATITUDE_COLUMN).unwrap().values,
        &[None, None, Some(48.5)],
    );
}

// ============================================
// Dataset Tests
// ============================================

#[test]
fn test_dataset_channel_union() {
    let with_temp = obd_csv(
        ';',
        &[
            row(SPEED, 0.0, 10.0, "km/h"),
            row("Transmission Temperature (var.2)", 0.0, 60.0, "C"),
        ],
    );
    let dataset = Dataset::from_files([
        LoadedFile::new(PathBuf::from("one.csv"), 2, wide_from(&with_temp)),
        LoadedFile::new(
            PathBuf::from("two.csv"),
            6,
            wide_from(&obd_csv(';', &drive_rows(0.0, 2))),
        ),
    ]);

    assert_eq!(
        dataset.sensor_channels().collect::<Vec<_>>(),
        vec![RPM, FUEL, "Transmission Temperature (var.2)", SPEED]
    );
}
