//! Tests for delimiter sniffing

use obdplot::error::IngestError;
use obdplot::parsers::{detect_delimiter, detect_file_delimiter};

use crate::common::{drive_rows, obd_csv, obd_csv_with_gps, write_log};

// ============================================
// Sample Detection Tests
// ============================================

#[test]
fn test_detects_each_candidate() {
    for d in [',', '\t', ';', '|'] {
        let csv = obd_csv(d, &drive_rows(0.0, 3));
        assert_eq!(
            detect_delimiter(csv.as_bytes(), false).unwrap(),
            d as u8,
            "delimiter {:?}",
            d
        );
    }
}

#[test]
fn test_comma_preferred_when_both_consistent() {
    // Both ',' and ';' appear once per line
    let sample = b"a,b;c\n1,2;3\n4,5;6\n";
    assert_eq!(detect_delimiter(sample, false).unwrap(), b',');
}

#[test]
fn test_quoted_delimiters_are_ignored() {
    let sample = b"PID;SECONDS;VALUE;UNITS\n\"Fuel; trip\";1;2;l\nRPM;2;3;rpm\n";
    assert_eq!(detect_delimiter(sample, false).unwrap(), b';');
}

#[test]
fn test_empty_sample_fails() {
    let err = detect_delimiter(b"", false).unwrap_err();
    assert!(matches!(err, IngestError::DelimiterDetection(_)));
}

#[test]
fn test_inconsistent_sample_fails() {
    let err = detect_delimiter(b"a,b\nc,d,e\nf\n", false).unwrap_err();
    assert!(matches!(err, IngestError::DelimiterDetection(_)));
}

// ============================================
// File Sampling Tests
// ============================================

#[test]
fn test_large_file_truncated_line_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    // Well over the 4096-byte sample, so the sample ends mid-line
    let csv = obd_csv_with_gps(';', &drive_rows(1_694_430_000.0, 200));
    assert!(csv.len() > 8192);
    let path = write_log(dir.path(), "long.csv", &csv);

    assert_eq!(detect_file_delimiter(&path).unwrap(), b';');
}

#[test]
fn test_missing_file_is_io_error() {
    let err = detect_file_delimiter(std::path::Path::new("/no/such/log.csv")).unwrap_err();
    assert!(matches!(err, IngestError::Io { .. }));
}
