//! Wide per-file tables: one row per time tick, one column per sensor.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::MissingChannel;
use crate::resample::ResampledSeries;

/// Column name of the derived latitude series
pub const LATITUDE_COLUMN: &str = "LATITUDE";
/// Column name of the derived longitude series
pub const LONGITUDE_COLUMN: &str = "LONGITUDE";

/// Whether GPS coordinates were attached to a wide table
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GpsStatus {
    /// LATITUDE/LONGITUDE columns follow the grid of `sensor`
    Attached { sensor: String },
    /// The GPS-bearing sensor never occurs in the file
    SensorMissing { sensor: String },
    /// The file has no LATITUDE/LONGITUDE header columns
    NoCoordinateColumns,
    /// The sensor occurs but none of its rows carry coordinates
    NoCoordinates { sensor: String },
}

impl GpsStatus {
    pub fn is_attached(&self) -> bool {
        matches!(self, GpsStatus::Attached { .. })
    }
}

impl std::fmt::Display for GpsStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpsStatus::Attached { sensor } => write!(f, "attached to '{}'", sensor),
            GpsStatus::SensorMissing { sensor } => {
                write!(f, "no GPS data available ('{}' not in file)", sensor)
            }
            GpsStatus::NoCoordinateColumns => {
                write!(f, "no GPS data available (no LATITUDE/LONGITUDE columns)")
            }
            GpsStatus::NoCoordinates { sensor } => {
                write!(f, "no GPS data available ('{}' rows carry no coordinates)", sensor)
            }
        }
    }
}

/// A resampled series ready to be joined, labelled with its channel
#[derive(Clone, Debug)]
pub struct NamedSeries {
    pub name: String,
    pub unit: String,
    pub series: ResampledSeries,
}

/// One channel of a wide table
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub unit: String,
    /// One entry per table row; None where this sensor has no tick
    pub values: Vec<Option<f64>>,
}

/// Outer join of every resampled sensor of one file
#[derive(Clone, Debug, PartialEq)]
pub struct WideTable {
    /// Time index in seconds since the file start, strictly ascending
    pub times: Vec<f64>,
    pub columns: Vec<Column>,
    pub gps: GpsStatus,
    /// Original SECONDS value of time zero
    pub time_offset: f64,
}

/// Integer key for a tick, stable across float rounding
fn time_key(t: f64) -> i64 {
    (t * 1e6).round() as i64
}

impl WideTable {
    /// Outer-join series on the union of their ticks.
    ///
    /// Columns keep the order of `series`.
    pub fn join(series: Vec<NamedSeries>, gps: GpsStatus, time_offset: f64) -> Self {
        let mut index: BTreeMap<i64, f64> = BTreeMap::new();
        for named in &series {
            for t in named.series.times() {
                index.entry(time_key(t)).or_insert(t);
            }
        }

        let rows: BTreeMap<i64, usize> = index
            .keys()
            .enumerate()
            .map(|(row, &key)| (key, row))
            .collect();
        let times: Vec<f64> = index.into_values().collect();

        let columns = series
            .into_iter()
            .map(|named| {
                let mut values = vec![None; times.len()];
                for (t, v) in named.series.times().zip(named.series.values.iter()) {
                    if let Some(&row) = rows.get(&time_key(t)) {
                        values[row] = *v;
                    }
                }
                Column {
                    name: named.name,
                    unit: named.unit,
                    values,
                }
            })
            .collect();

        Self {
            times,
            columns,
            gps,
            time_offset,
        }
    }

    /// Look up a channel, reporting an explicit [`MissingChannel`] if absent
    pub fn channel(&self, name: &str) -> Result<&Column, MissingChannel> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| MissingChannel {
                channel: name.to_string(),
            })
    }

    /// Wall-clock instant of time zero, reading SECONDS as Unix epoch seconds
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_micros((self.time_offset * 1e6).round() as i64)
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn row_count(&self) -> usize {
        self.times.len()
    }

    /// (time, value) for every row where the channel is defined
    pub fn channel_points(&self, name: &str) -> Result<Vec<(f64, f64)>, MissingChannel> {
        let column = self.channel(name)?;
        Ok(self
            .times
            .iter()
            .zip(column.values.iter())
            .filter_map(|(&t, v)| v.map(|v| (t, v)))
            .collect())
    }

    /// (x, y) for every row where both channels are defined
    pub fn paired(&self, x: &str, y: &str) -> Result<Vec<(f64, f64)>, MissingChannel> {
        let xs = self.channel(x)?;
        let ys = self.channel(y)?;
        Ok(xs
            .values
            .iter()
            .zip(ys.values.iter())
            .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
            .collect())
    }

    /// (longitude, latitude, value) for every row where all three are defined
    pub fn geo_points(&self, channel: &str) -> Result<Vec<(f64, f64, f64)>, MissingChannel> {
        let lon = self.channel(LONGITUDE_COLUMN)?;
        let lat = self.channel(LATITUDE_COLUMN)?;
        let values = self.channel(channel)?;
        Ok(lon
            .values
            .iter()
            .zip(lat.values.iter())
            .zip(values.values.iter())
            .filter_map(|((lon, lat), v)| Some(((*lon)?, (*lat)?, (*v)?)))
            .collect())
    }
}
