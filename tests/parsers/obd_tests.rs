//! Tests for the OBD-II CSV parser

use obdplot::error::IngestError;
use obdplot::parsers::{ObdCsv, Parseable};

use crate::common::{
    assert_close, drive_rows, obd_csv, obd_csv_with_gps, row, write_log, FUEL, RPM, SPEED,
};

// ============================================
// Parsing Tests
// ============================================

#[test]
fn test_parse_pids_first_seen_order() {
    let csv = obd_csv(',', &drive_rows(0.0, 4));
    let table = ObdCsv::new(b',').parse(&csv).unwrap();

    assert_eq!(table.records.len(), 12);
    assert_eq!(table.pids, vec![SPEED, FUEL, RPM]);
    assert!(!table.has_coordinates);
    assert_eq!(table.unit_of(FUEL), Some("l/100km"));
}

#[test]
fn test_parse_coordinates_optional_cells() {
    let mut rows = drive_rows(0.0, 2);
    rows.push(row(SPEED, 5.0, 30.0, "km/h"));
    let csv = obd_csv_with_gps(';', &rows);
    let table = ObdCsv::new(b';').parse(&csv).unwrap();

    assert!(table.has_coordinates);
    let speeds: Vec<_> = table.records_for(SPEED).collect();
    assert_eq!(speeds.len(), 3);
    assert_close(speeds[0].latitude.unwrap(), 48.0);
    assert_eq!(speeds[2].latitude, None);
    assert_eq!(speeds[2].longitude, None);
    // Non-GPS sensors have empty coordinate cells
    assert!(table.records_for(RPM).all(|r| r.latitude.is_none()));
}

#[test]
fn test_missing_required_column() {
    let csv = "PID;SECONDS;VALUE\nRPM;0;800\n";
    let err = ObdCsv::new(b';').parse(csv).unwrap_err();
    match err {
        IngestError::Schema { column } => assert_eq!(column, "UNITS"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_non_numeric_value_reports_line() {
    let csv = "PID;SECONDS;VALUE;UNITS\nRPM;0;800;rpm\nRPM;1;fast;rpm\n";
    let err = ObdCsv::new(b';').parse(csv).unwrap_err();
    match err {
        IngestError::TypeConversion {
            column,
            line,
            value,
        } => {
            assert_eq!(column, "VALUE");
            assert_eq!(line, 3);
            assert_eq!(value, "fast");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_non_numeric_seconds() {
    let csv = "PID,SECONDS,VALUE,UNITS\nRPM,noon,800,rpm\n";
    let err = ObdCsv::new(b',').parse(csv).unwrap_err();
    assert!(matches!(
        err,
        IngestError::TypeConversion { ref column, .. } if column == "SECONDS"
    ));
}

#[test]
fn test_infinite_seconds_rejected() {
    let csv = obd_csv(
        ';',
        &[row(RPM, 0.0, 800.0, "rpm"), row(RPM, f64::INFINITY, 900.0, "rpm")],
    );
    let err = ObdCsv::new(b';').parse(&csv).unwrap_err();
    assert!(matches!(
        err,
        IngestError::TypeConversion { ref column, line: 3, ref value }
            if column == "SECONDS" && value == "inf"
    ));
}

#[test]
fn test_nan_value_rejected() {
    let csv = "PID,SECONDS,VALUE,UNITS\nRPM,0,NaN,rpm\n";
    let err = ObdCsv::new(b',').parse(csv).unwrap_err();
    assert!(matches!(
        err,
        IngestError::TypeConversion { ref column, .. } if column == "VALUE"
    ));
}

#[test]
fn test_header_only_is_empty_file() {
    let err = ObdCsv::new(b',').parse("PID,SECONDS,VALUE,UNITS\n").unwrap_err();
    assert!(matches!(err, IngestError::EmptyFile));
}

// ============================================
// Loading Tests
// ============================================

#[test]
fn test_load_sniffs_and_normalizes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(
        dir.path(),
        "trip.csv",
        &obd_csv_with_gps(';', &drive_rows(1_694_430_000.0, 5)),
    );

    let table = ObdCsv::load(&path, None).unwrap();
    assert_close(table.min_seconds().unwrap(), 0.0);
    assert_close(table.time_offset, 1_694_430_000.1);
    assert!(table.pids.iter().any(|p| p == SPEED));
}

#[test]
fn test_load_with_fixed_delimiter() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(dir.path(), "tabs.csv", &obd_csv('\t', &drive_rows(10.0, 3)));

    let table = ObdCsv::load(&path, Some(b'\t')).unwrap();
    assert_eq!(table.records.len(), 9);
    assert_close(table.min_seconds().unwrap(), 0.0);

    // The wrong fixed delimiter leaves a single unnamed column
    assert!(matches!(
        ObdCsv::load(&path, Some(b',')),
        Err(IngestError::Schema { .. })
    ));
}
