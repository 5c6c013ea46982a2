//! Long-to-wide reshaping: split by sensor, deduplicate, resample, join.
//!
//! All sensors of a file share one grid of ticks `k * interval` counted from
//! the normalized time zero. Each sensor covers the ticks from the last one
//! at or before its first sample up to the last one at or before its final
//! sample. A tick takes the value of the latest sample at or before it, so
//! gaps carry the last value forward and ticks before the first sample stay
//! empty.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::error::ReshapeError;
use crate::parsers::LogTable;
use crate::table::{GpsStatus, NamedSeries, WideTable, LATITUDE_COLUMN, LONGITUDE_COLUMN};

/// Tolerance when comparing sample times against grid ticks
const TIME_EPSILON: f64 = 1e-9;

/// Most ticks a single sensor may occupy (about 115 days at 1 s)
pub const MAX_TICKS: usize = 10_000_000;

/// Which row survives when a sensor reports the same timestamp twice
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DedupPolicy {
    /// Keep the earliest row in file order
    #[default]
    First,
    /// Keep the latest row in file order
    Last,
}

/// Deduplicated samples of one sensor, ascending by time
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SensorSeries {
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

impl SensorSeries {
    /// Build from (time, value) samples in file order
    pub fn from_samples<I>(samples: I, policy: DedupPolicy) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut samples: Vec<(f64, f64)> = samples.into_iter().collect();
        // Stable: equal timestamps keep file order
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut series = SensorSeries {
            times: Vec::with_capacity(samples.len()),
            values: Vec::with_capacity(samples.len()),
        };

        for (t, v) in samples {
            match series.times.last() {
                Some(&last) if (t - last).abs() <= TIME_EPSILON => {
                    if policy == DedupPolicy::Last {
                        if let Some(slot) = series.values.last_mut() {
                            *slot = v;
                        }
                    }
                }
                _ => {
                    series.times.push(t);
                    series.values.push(v);
                }
            }
        }

        series
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Forward-fill onto `ticks` grid points `start + k * interval`
    pub fn forward_fill(&self, start: f64, interval: f64, ticks: usize) -> Vec<Option<f64>> {
        let mut out = Vec::with_capacity(ticks);
        let mut next = 0usize;
        let mut current: Option<f64> = None;

        for k in 0..ticks {
            let tick = start + k as f64 * interval;
            while next < self.times.len() && self.times[next] <= tick + TIME_EPSILON {
                current = Some(self.values[next]);
                next += 1;
            }
            out.push(current);
        }

        out
    }
}

/// A series on a regular grid
#[derive(Clone, Debug, PartialEq)]
pub struct ResampledSeries {
    pub start: f64,
    pub interval: f64,
    /// One entry per tick
    pub values: Vec<Option<f64>>,
}

impl ResampledSeries {
    pub fn tick(&self, k: usize) -> f64 {
        self.start + k as f64 * self.interval
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.values.len()).map(move |k| self.tick(k))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The resample interval must be positive and finite
pub fn validate_interval(interval: f64) -> Result<(), ReshapeError> {
    if interval.is_finite() && interval > 0.0 {
        Ok(())
    } else {
        Err(ReshapeError::InvalidInterval(interval))
    }
}

/// Index of the last grid tick at or before `t`
fn grid_index(t: f64, interval: f64) -> f64 {
    (t / interval + TIME_EPSILON).floor()
}

/// Resample the sensor `name` onto the shared grid. Returns None for an
/// empty series
pub fn resample(
    name: &str,
    series: &SensorSeries,
    interval: f64,
) -> Result<Option<ResampledSeries>, ReshapeError> {
    validate_interval(interval)?;

    let (Some(&first), Some(&last)) = (series.times.first(), series.times.last()) else {
        return Ok(None);
    };

    let first_index = grid_index(first, interval);
    let ticks = grid_index(last, interval) - first_index + 1.0;
    if !ticks.is_finite() || ticks > MAX_TICKS as f64 {
        return Err(ReshapeError::TooManyTicks {
            sensor: name.to_string(),
            ticks,
            limit: MAX_TICKS,
        });
    }

    let start = first_index * interval;
    let ticks = ticks as usize;
    Ok(Some(ResampledSeries {
        start,
        interval,
        values: series.forward_fill(start, interval, ticks),
    }))
}

/// Knobs controlling [`reshape`]
#[derive(Clone, Debug)]
pub struct ReshapeOptions {
    pub interval: f64,
    pub dedup: DedupPolicy,
    /// Sensor whose rows carry the coordinates attached as GPS columns
    pub gps_sensor: String,
}

impl Default for ReshapeOptions {
    fn default() -> Self {
        Self {
            interval: 1.0,
            dedup: DedupPolicy::First,
            gps_sensor: "Vehicle speed".to_string(),
        }
    }
}

/// Split, deduplicate and resample every sensor of one file, then join
pub fn reshape(table: &LogTable, options: &ReshapeOptions) -> Result<WideTable, ReshapeError> {
    validate_interval(options.interval)?;

    let mut named = Vec::with_capacity(table.pids.len() + 2);
    for pid in &table.pids {
        let series = SensorSeries::from_samples(
            table.records_for(pid).map(|r| (r.seconds, r.value)),
            options.dedup,
        );
        let Some(resampled) = resample(pid, &series, options.interval)? else {
            continue;
        };

        tracing::debug!(
            "Sensor '{}': {} samples -> {} ticks",
            pid,
            series.len(),
            resampled.len()
        );

        named.push(NamedSeries {
            name: pid.clone(),
            unit: table.unit_of(pid).unwrap_or_default().to_string(),
            series: resampled,
        });
    }

    let gps = attach_gps(table, options, &mut named);

    Ok(WideTable::join(named, gps, table.time_offset))
}

/// Append LATITUDE/LONGITUDE columns on the GPS sensor's ticks, if possible
fn attach_gps(
    table: &LogTable,
    options: &ReshapeOptions,
    named: &mut Vec<NamedSeries>,
) -> GpsStatus {
    let sensor = &options.gps_sensor;

    if !table.has_coordinates {
        return GpsStatus::NoCoordinateColumns;
    }

    let Some(grid) = named
        .iter()
        .find(|n| &n.name == sensor)
        .map(|n| (n.series.start, n.series.len()))
    else {
        return GpsStatus::SensorMissing {
            sensor: sensor.clone(),
        };
    };

    let coordinate = |pick: fn(&crate::parsers::RawRecord) -> Option<f64>| {
        SensorSeries::from_samples(
            table
                .records_for(sensor)
                .filter_map(|r| pick(r).map(|c| (r.seconds, c))),
            options.dedup,
        )
    };
    let latitudes = coordinate(|r| r.latitude);
    let longitudes = coordinate(|r| r.longitude);

    if latitudes.is_empty() || longitudes.is_empty() {
        return GpsStatus::NoCoordinates {
            sensor: sensor.clone(),
        };
    }

    let (start, ticks) = grid;
    for (name, series) in [(LATITUDE_COLUMN, latitudes), (LONGITUDE_COLUMN, longitudes)] {
        named.push(NamedSeries {
            name: name.to_string(),
            unit: "deg".to_string(),
            series: ResampledSeries {
                start,
                interval: options.interval,
                values: series.forward_fill(start, options.interval, ticks),
            },
        });
    }

    GpsStatus::Attached {
        sensor: sensor.clone(),
    }
}
