use serde::Serialize;

use crate::error::IngestError;

/// One diagnostic reading: a single (timestamp, sensor) pair
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RawRecord {
    /// Sensor identifier (the PID column)
    pub pid: String,
    /// Timestamp in seconds. Relative to the file start once normalized
    pub seconds: f64,
    pub value: f64,
    pub unit: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Parsed log file in long format (one row per timestamp + sensor)
#[derive(Clone, Debug, Default)]
pub struct LogTable {
    /// Records in file order
    pub records: Vec<RawRecord>,
    /// Unique PIDs in first-seen order
    pub pids: Vec<String>,
    /// Original minimum SECONDS value subtracted during normalization
    pub time_offset: f64,
    /// Whether the header carried LATITUDE and LONGITUDE columns
    pub has_coordinates: bool,
}

impl LogTable {
    /// Shift every timestamp so the earliest record sits at zero
    pub fn normalize_times(&mut self) {
        let Some(min) = self.min_seconds() else {
            return;
        };

        for record in &mut self.records {
            record.seconds -= min;
        }
        self.time_offset += min;
    }

    /// Records belonging to one sensor, in file order
    pub fn records_for<'a, 'p>(
        &'a self,
        pid: &'p str,
    ) -> impl Iterator<Item = &'a RawRecord> + use<'a, 'p> {
        self.records.iter().filter(move |r| r.pid == pid)
    }

    /// Unit of a sensor (first UNITS value seen)
    pub fn unit_of(&self, pid: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.pid == pid)
            .map(|r| r.unit.as_str())
    }

    pub fn min_seconds(&self) -> Option<f64> {
        self.records
            .iter()
            .map(|r| r.seconds)
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// Trait for log file parsers
pub trait Parseable {
    fn parse(&self, data: &str) -> Result<LogTable, IngestError>;
}
