//! OBD-II long-format CSV logs.
//!
//! Each row is one reading of one sensor:
//!
//! ```text
//! PID;SECONDS;VALUE;UNITS;LATITUDE;LONGITUDE
//! Vehicle speed;1694430000.12;42;km/h;48.1372;11.5756
//! Engine RPM;1694430000.40;1850;rpm;48.1372;11.5756
//! ```
//!
//! The coordinate columns are optional. Column names are case-sensitive.

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use super::delimiter::detect_file_delimiter;
use super::types::{LogTable, Parseable, RawRecord};
use crate::error::IngestError;

pub const COL_PID: &str = "PID";
pub const COL_SECONDS: &str = "SECONDS";
pub const COL_VALUE: &str = "VALUE";
pub const COL_UNITS: &str = "UNITS";
pub const COL_LATITUDE: &str = "LATITUDE";
pub const COL_LONGITUDE: &str = "LONGITUDE";

/// Header positions resolved once per file
#[derive(Clone, Copy, Debug)]
struct ColumnIndex {
    pid: usize,
    seconds: usize,
    value: usize,
    units: usize,
    coordinates: Option<(usize, usize)>,
}

impl ColumnIndex {
    fn from_header(header: &StringRecord) -> Result<Self, IngestError> {
        let find = |name: &str| header.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| IngestError::Schema {
                column: name.to_string(),
            })
        };

        let coordinates = match (find(COL_LATITUDE), find(COL_LONGITUDE)) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        };

        Ok(Self {
            pid: require(COL_PID)?,
            seconds: require(COL_SECONDS)?,
            value: require(COL_VALUE)?,
            units: require(COL_UNITS)?,
            coordinates,
        })
    }
}

/// OBD-II CSV parser for a known delimiter
pub struct ObdCsv {
    pub delimiter: u8,
}

impl Default for ObdCsv {
    fn default() -> Self {
        Self { delimiter: b';' }
    }
}

impl ObdCsv {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Read, sniff (unless `fixed_delimiter` is given), parse and normalize one file
    pub fn load(path: &Path, fixed_delimiter: Option<u8>) -> Result<LogTable, IngestError> {
        let delimiter = match fixed_delimiter {
            Some(d) => d,
            None => detect_file_delimiter(path)?,
        };

        let contents = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut table = Self::new(delimiter).parse(&contents)?;
        table.normalize_times();

        tracing::info!(
            "Parsed {}: {} records, {} sensors (delimiter {:?})",
            path.display(),
            table.records.len(),
            table.pids.len(),
            delimiter as char
        );

        Ok(table)
    }
}

fn parse_number(
    record: &StringRecord,
    idx: usize,
    column: &str,
) -> Result<f64, IngestError> {
    let raw = record.get(idx).unwrap_or("");
    // `f64::from_str` also accepts inf and NaN
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(IngestError::TypeConversion {
            column: column.to_string(),
            line: record.position().map(|p| p.line()).unwrap_or(0),
            value: raw.to_string(),
        }),
    }
}

fn parse_optional_number(
    record: &StringRecord,
    idx: usize,
    column: &str,
) -> Result<Option<f64>, IngestError> {
    match record.get(idx) {
        None | Some("") => Ok(None),
        Some(_) => parse_number(record, idx, column).map(Some),
    }
}

impl Parseable for ObdCsv {
    fn parse(&self, file_contents: &str) -> Result<LogTable, IngestError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(file_contents.as_bytes());

        let columns = ColumnIndex::from_header(reader.headers()?)?;

        let mut records = Vec::new();
        let mut pids: Vec<String> = Vec::new();

        for row in reader.records() {
            let row = row?;

            let pid = row.get(columns.pid).unwrap_or("").to_string();
            let seconds = parse_number(&row, columns.seconds, COL_SECONDS)?;
            let value = parse_number(&row, columns.value, COL_VALUE)?;
            let unit = row.get(columns.units).unwrap_or("").to_string();

            let (latitude, longitude) = match columns.coordinates {
                Some((lat, lon)) => (
                    parse_optional_number(&row, lat, COL_LATITUDE)?,
                    parse_optional_number(&row, lon, COL_LONGITUDE)?,
                ),
                None => (None, None),
            };

            if !pids.contains(&pid) {
                pids.push(pid.clone());
            }

            records.push(RawRecord {
                pid,
                seconds,
                value,
                unit,
                latitude,
                longitude,
            });
        }

        if records.is_empty() {
            return Err(IngestError::EmptyFile);
        }

        Ok(LogTable {
            records,
            pids,
            time_offset: 0.0,
            has_coordinates: columns.coordinates.is_some(),
        })
    }
}
