//! Tests for wide-table CSV export and per-file charts

use obdplot::charts::ChartSpec;
use obdplot::pipeline::run;
use obdplot::settings::Settings;

use crate::common::{aligned_rows, obd_csv_with_gps, row, write_log, SPEED};

#[test]
fn test_export_tables_with_timestamps() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let mut rows = aligned_rows(100.0, 3);
    // Fuel stops reporting early; the gap is forward filled
    rows.retain(|r| !(r.pid == "Fuel consumption" && r.seconds > 100.0));
    rows.push(row("Fuel consumption", 102.0, 9.0, "l/100km"));
    write_log(input.path(), "trip.csv", &obd_csv_with_gps(';', &rows));

    let settings = Settings {
        input: Some(input.path().to_path_buf()),
        output: output.path().to_path_buf(),
        export_tables: true,
        time_origin: Some("2024-05-01T12:00:00Z".parse().unwrap()),
        charts: vec![],
        ..Settings::default()
    };
    let report = run(&settings).unwrap();

    let table_path = output.path().join("tables").join("trip.csv");
    assert_eq!(report.tables, vec![table_path.clone()]);
    assert!(report.charts.is_empty());

    let mut reader = csv::Reader::from_path(&table_path).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(
        header,
        vec![
            "SECONDS",
            "TIMESTAMP",
            SPEED,
            "Fuel consumption",
            "Engine RPM",
            "LATITUDE",
            "LONGITUDE"
        ]
    );

    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 3);
    assert_eq!(&records[1][0], "1");
    assert_eq!(&records[1][1], "2024-05-01T12:00:01.000Z");
    assert_eq!(&records[1][3], "6");
    assert_eq!(&records[2][3], "9");
}

#[test]
fn test_export_timestamps_default_to_file_start() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_log(
        input.path(),
        "trip.csv",
        &obd_csv_with_gps(';', &aligned_rows(1_694_430_000.0, 3)),
    );

    let settings = Settings {
        input: Some(input.path().to_path_buf()),
        output: output.path().to_path_buf(),
        export_tables: true,
        charts: vec![],
        ..Settings::default()
    };
    run(&settings).unwrap();

    let mut reader = csv::Reader::from_path(output.path().join("tables").join("trip.csv")).unwrap();
    assert_eq!(&reader.headers().unwrap()[1], "TIMESTAMP");
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(&records[0][1], "2023-09-11T11:00:00.000Z");
    assert_eq!(&records[2][1], "2023-09-11T11:00:02.000Z");
}

#[test]
fn test_per_file_chart_directories() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_log(
        input.path(),
        "morning drive.csv",
        &obd_csv_with_gps(';', &aligned_rows(0.0, 5)),
    );

    let settings = Settings {
        input: Some(input.path().to_path_buf()),
        output: output.path().to_path_buf(),
        charts: vec![ChartSpec::PerFile],
        image_width: 320,
        image_height: 240,
        ..Settings::default()
    };
    let report = run(&settings).unwrap();

    let dir = output.path().join("morning_drive");
    assert!(dir.join("Vehicle_speed.png").exists());
    assert!(dir.join("Engine_RPM.png").exists());
    assert!(!dir.join("LATITUDE.png").exists());
    assert_eq!(report.charts.len(), 3);

    let img = image::open(dir.join("Vehicle_speed.png")).unwrap();
    assert_eq!((img.width(), img.height()), (320, 240));
}
