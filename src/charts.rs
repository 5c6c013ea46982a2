//! Chart menu and planning.
//!
//! A [`ChartSpec`] names a chart kind from the fixed menu. [`plan_charts`]
//! turns the configured menu into concrete [`ChartJob`]s over a
//! [`Dataset`], recording a [`ChartSkip`] whenever a file lacks a channel
//! the chart asks for. Rendering happens in [`crate::export`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::analysis::{geo_difference_points, rate_pairs};
use crate::analysis::statistics::value_bounds;
use crate::state::{file_color, Dataset};

/// How the time axis of line charts is ticked
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimeAxis {
    /// Seconds since the start of each file
    #[default]
    Elapsed,
    /// Whole-minute boundaries of origin + elapsed seconds. The origin is
    /// the configured one, else the first plotted file's start
    WallClock,
}

/// What colours the points of a geographic chart
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GeoMode {
    /// The channel value itself
    #[default]
    Value,
    /// Row-to-row difference of the channel
    Difference,
}

/// Geographic bounding box in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    /// Smallest box around the points, padded by 2% per side
    pub fn around(points: &[(f64, f64, f64)]) -> Option<Self> {
        let (min_lon, max_lon) = value_bounds(points.iter().map(|p| p.0))?;
        let (min_lat, max_lat) = value_bounds(points.iter().map(|p| p.1))?;
        let pad_lon = ((max_lon - min_lon) * 0.02).max(1e-4);
        let pad_lat = ((max_lat - min_lat) * 0.02).max(1e-4);
        Some(Self {
            min_lon: min_lon - pad_lon,
            max_lon: max_lon + pad_lon,
            min_lat: min_lat - pad_lat,
            max_lat: max_lat + pad_lat,
        })
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        (self.min_lon..=self.max_lon).contains(&lon) && (self.min_lat..=self.max_lat).contains(&lat)
    }

    pub fn is_valid(&self) -> bool {
        self.min_lon < self.max_lon && self.min_lat < self.max_lat
    }
}

/// One entry of the configurable chart menu
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    /// One line chart per channel, one line per file
    TimeSeries,
    /// `y` against `x`, one colour per file
    Scatter { x: String, y: String },
    /// Change of `channel` over `lag` rows against `against`
    RateScatter {
        channel: String,
        lag: usize,
        against: String,
    },
    /// Coordinates coloured by `channel`, aggregated over all files
    Geo {
        channel: String,
        #[serde(default)]
        mode: GeoMode,
        /// Drop points whose colour value lies outside `[min, max]`
        #[serde(default)]
        clip: Option<[f64; 2]>,
    },
    /// One chart per channel per file, in a directory per file
    PerFile,
}

impl ChartSpec {
    /// Short human label used in logs and the report
    pub fn label(&self) -> String {
        match self {
            ChartSpec::TimeSeries => "time series".to_string(),
            ChartSpec::Scatter { x, y } => format!("{} vs {}", y, x),
            ChartSpec::RateScatter {
                channel,
                lag,
                against,
            } => format!("d{} (lag {}) vs {}", channel, lag, against),
            ChartSpec::Geo { channel, mode, .. } => match mode {
                GeoMode::Value => format!("map of {}", channel),
                GeoMode::Difference => format!("map of d{}", channel),
            },
            ChartSpec::PerFile => "per-file channels".to_string(),
        }
    }
}

/// The chart menu used when no settings file overrides it
pub fn default_menu() -> Vec<ChartSpec> {
    vec![
        ChartSpec::TimeSeries,
        ChartSpec::Scatter {
            x: "Vehicle speed".to_string(),
            y: "Fuel consumption".to_string(),
        },
        ChartSpec::Scatter {
            x: "Vehicle speed".to_string(),
            y: "Transmission Temperature (var.2)".to_string(),
        },
        ChartSpec::RateScatter {
            channel: "Vehicle speed".to_string(),
            lag: 5,
            against: "Fuel consumption".to_string(),
        },
        ChartSpec::Geo {
            channel: "Vehicle speed".to_string(),
            mode: GeoMode::Value,
            clip: None,
        },
        ChartSpec::Geo {
            channel: "Transmission Temperature (var.2)".to_string(),
            mode: GeoMode::Difference,
            clip: Some([-2.0, 2.0]),
        },
    ]
}

/// Replace spaces and slashes so a channel name is a safe file name
pub fn sanitize_file_name(name: &str) -> String {
    name.replace([' ', '/'], "_")
}

/// Points of one file drawn in one colour
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub label: String,
    pub color: [u8; 3],
    pub points: Vec<(f64, f64)>,
}

/// Everything a renderer needs for one image
#[derive(Clone, Debug, PartialEq)]
pub enum ChartData {
    /// Polylines against time
    Lines {
        series: Vec<Series>,
        /// Start of the first plotted file
        origin: Option<DateTime<Utc>>,
    },
    /// Unconnected points
    Scatter { series: Vec<Series> },
    /// (longitude, latitude, colour value) inside a box
    Geo {
        points: Vec<(f64, f64, f64)>,
        bounds: GeoBounds,
        color_range: (f64, f64),
    },
}

/// A planned chart: where it goes and what it shows
#[derive(Clone, Debug, PartialEq)]
pub struct ChartJob {
    pub title: String,
    /// Path relative to the output directory
    pub file_name: PathBuf,
    pub data: ChartData,
}

/// Why a file (or a whole chart) was left out
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The file lacks a channel the chart needs
    MissingChannel { channel: String },
    /// The file has no GPS columns
    NoGps,
    /// No file contributed any point
    NoData,
}

/// A chart/file combination that was not drawn
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSkip {
    pub chart: String,
    /// None when the whole chart was dropped
    pub file: Option<String>,
    #[serde(flatten)]
    pub reason: SkipReason,
}

impl std::fmt::Display for ChartSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match &self.reason {
            SkipReason::MissingChannel { channel } => format!("channel '{}' not present", channel),
            SkipReason::NoGps => "no GPS data".to_string(),
            SkipReason::NoData => "no data".to_string(),
        };
        match &self.file {
            Some(file) => write!(f, "{} [{}]: {}", self.chart, file, reason),
            None => write!(f, "{}: {}", self.chart, reason),
        }
    }
}

/// Output of [`plan_charts`]
#[derive(Clone, Debug, Default)]
pub struct ChartPlan {
    pub jobs: Vec<ChartJob>,
    pub skips: Vec<ChartSkip>,
}

/// Planning knobs taken from the settings
#[derive(Clone, Debug, Default)]
pub struct PlanOptions {
    pub geo_bounds: Option<GeoBounds>,
}

impl ChartPlan {
    fn skip(&mut self, chart: &str, file: Option<&str>, reason: SkipReason) {
        tracing::info!(
            "Skipping {}{}: {:?}",
            chart,
            file.map(|f| format!(" for {}", f)).unwrap_or_default(),
            reason
        );
        self.skips.push(ChartSkip {
            chart: chart.to_string(),
            file: file.map(str::to_string),
            reason,
        });
    }

    /// Push a job unless it has nothing to draw, renaming it if its path is
    /// already taken
    fn push_or_skip(&mut self, mut job: ChartJob) {
        let empty = match &job.data {
            ChartData::Lines { series, .. } | ChartData::Scatter { series } => {
                series.iter().all(|s| s.points.is_empty())
            }
            ChartData::Geo { points, .. } => points.is_empty(),
        };
        if empty {
            let title = job.title.clone();
            self.skip(&title, None, SkipReason::NoData);
            return;
        }

        if self.has_file_name(&job.file_name) {
            let unique = self.unique_file_name(&job.file_name);
            tracing::warn!(
                "{} would overwrite {}; writing {} instead",
                job.title,
                job.file_name.display(),
                unique.display()
            );
            job.file_name = unique;
        }
        self.jobs.push(job);
    }

    fn has_file_name(&self, name: &Path) -> bool {
        self.jobs.iter().any(|j| j.file_name == name)
    }

    /// First free `<stem>_<n>.<ext>` next to `name`, counting from 2
    fn unique_file_name(&self, name: &Path) -> PathBuf {
        let stem = name
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = name
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "png".to_string());

        let mut n = 2usize;
        loop {
            let candidate = name.with_file_name(format!("{}_{}.{}", stem, n, ext));
            if !self.has_file_name(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Expand the chart menu over the dataset
pub fn plan_charts(dataset: &Dataset, menu: &[ChartSpec], options: &PlanOptions) -> ChartPlan {
    let mut plan = ChartPlan::default();

    for spec in menu {
        match spec {
            ChartSpec::TimeSeries => plan_time_series(dataset, &mut plan),
            ChartSpec::Scatter { x, y } => {
                let label = spec.label();
                let series = per_file_series(dataset, &label, &mut plan, |table| {
                    table.paired(x, y)
                });
                plan.push_or_skip(ChartJob {
                    title: label,
                    file_name: PathBuf::from(format!(
                        "{}_vs_{}.png",
                        sanitize_file_name(y),
                        sanitize_file_name(x)
                    )),
                    data: ChartData::Scatter { series },
                });
            }
            ChartSpec::RateScatter {
                channel,
                lag,
                against,
            } => {
                let label = spec.label();
                let series = per_file_series(dataset, &label, &mut plan, |table| {
                    rate_pairs(table, channel, *lag, against)
                });
                plan.push_or_skip(ChartJob {
                    title: label,
                    file_name: PathBuf::from(format!(
                        "d{}_lag{}_vs_{}.png",
                        sanitize_file_name(channel),
                        lag,
                        sanitize_file_name(against)
                    )),
                    data: ChartData::Scatter { series },
                });
            }
            ChartSpec::Geo {
                channel,
                mode,
                clip,
            } => plan_geo(dataset, spec, channel, *mode, *clip, options, &mut plan),
            ChartSpec::PerFile => plan_per_file(dataset, &mut plan),
        }
    }

    plan
}

/// Run `extract` on every file, collecting one series per file and a skip
/// for every file whose lookup fails
fn per_file_series<F>(
    dataset: &Dataset,
    label: &str,
    plan: &mut ChartPlan,
    extract: F,
) -> Vec<Series>
where
    F: Fn(&crate::table::WideTable) -> Result<Vec<(f64, f64)>, crate::error::MissingChannel>,
{
    let mut series = Vec::new();
    for (idx, file) in dataset.files().enumerate() {
        match extract(&file.table) {
            Ok(points) => series.push(Series {
                label: file.name.clone(),
                color: file_color(idx),
                points,
            }),
            Err(missing) => plan.skip(
                label,
                Some(&file.name),
                SkipReason::MissingChannel {
                    channel: missing.channel,
                },
            ),
        }
    }
    series
}

fn plan_time_series(dataset: &Dataset, plan: &mut ChartPlan) {
    for channel in dataset.sensor_channels() {
        let mut origin = None;
        let mut series = Vec::new();
        for (idx, file) in dataset.files().enumerate() {
            let Ok(points) = file.table.channel_points(channel) else {
                continue;
            };
            origin = origin.or_else(|| file.table.start_time());
            series.push(Series {
                label: file.name.clone(),
                color: file_color(idx),
                points,
            });
        }

        plan.push_or_skip(ChartJob {
            title: channel.to_string(),
            file_name: PathBuf::from(format!("{}.png", sanitize_file_name(channel))),
            data: ChartData::Lines { series, origin },
        });
    }
}

fn plan_per_file(dataset: &Dataset, plan: &mut ChartPlan) {
    for (idx, file) in dataset.files().enumerate() {
        let dir = PathBuf::from(sanitize_file_name(&file.stem()));
        for column in file.table.columns.iter() {
            if crate::state::is_coordinate_column(&column.name) {
                continue;
            }
            let points = file.table.channel_points(&column.name).unwrap_or_default();
            plan.push_or_skip(ChartJob {
                title: format!("{} [{}]", column.name, file.name),
                file_name: dir.join(format!("{}.png", sanitize_file_name(&column.name))),
                data: ChartData::Lines {
                    series: vec![Series {
                        label: file.name.clone(),
                        color: file_color(idx),
                        points,
                    }],
                    origin: file.table.start_time(),
                },
            });
        }
    }
}

fn plan_geo(
    dataset: &Dataset,
    spec: &ChartSpec,
    channel: &str,
    mode: GeoMode,
    clip: Option<[f64; 2]>,
    options: &PlanOptions,
    plan: &mut ChartPlan,
) {
    let label = spec.label();
    let (mut points, missing) = dataset.geo_aggregate(|table| match mode {
        GeoMode::Value => table.geo_points(channel),
        GeoMode::Difference => geo_difference_points(table, channel),
    });
    for (file, err) in missing {
        let reason = if file.table.gps.is_attached() {
            SkipReason::MissingChannel {
                channel: err.channel,
            }
        } else {
            SkipReason::NoGps
        };
        plan.skip(&label, Some(&file.name), reason);
    }

    if let Some([lo, hi]) = clip {
        points.retain(|&(_, _, v)| v >= lo && v <= hi);
    }

    let bounds = options
        .geo_bounds
        .or_else(|| GeoBounds::around(&points))
        .filter(GeoBounds::is_valid);
    let Some(bounds) = bounds else {
        plan.skip(&label, None, SkipReason::NoData);
        return;
    };
    points.retain(|&(lon, lat, _)| bounds.contains(lon, lat));

    let color_range = match clip {
        Some([lo, hi]) => (lo, hi),
        None => value_bounds(points.iter().map(|p| p.2)).unwrap_or((0.0, 1.0)),
    };

    let prefix = match mode {
        GeoMode::Value => "map_",
        GeoMode::Difference => "map_d_",
    };
    plan.push_or_skip(ChartJob {
        title: label,
        file_name: PathBuf::from(format!("{}{}.png", prefix, sanitize_file_name(channel))),
        data: ChartData::Geo {
            points,
            bounds,
            color_range,
        },
    });
}
