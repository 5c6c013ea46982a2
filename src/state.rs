//! Core data types and constants.
//!
//! This module holds the loaded-file and dataset structures shared by the
//! chart planner and the report, plus the chart colour palette.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::MissingChannel;
use crate::table::{WideTable, LATITUDE_COLUMN, LONGITUDE_COLUMN};

// ============================================================================
// Constants
// ============================================================================

/// Supported log file extension (used for directory globbing)
pub const LOG_EXTENSION: &str = "csv";

/// Color palette for chart lines, one per source file
pub const CHART_COLORS: &[[u8; 3]] = &[
    [113, 120, 78],  // Olive green (primary)
    [191, 78, 48],   // Rust orange (accent)
    [71, 108, 155],  // Blue (info)
    [159, 166, 119], // Sage green (success)
    [253, 193, 73],  // Amber (warning)
    [135, 30, 28],   // Dark red (error)
    [246, 247, 235], // Cream
    [100, 149, 237], // Cornflower blue
    [255, 127, 80],  // Coral
    [144, 238, 144], // Light green
];

/// Palette colour for the n-th file, wrapping around
pub fn file_color(index: usize) -> [u8; 3] {
    CHART_COLORS[index % CHART_COLORS.len()]
}

/// Whether a column is one of the derived GPS coordinates
pub fn is_coordinate_column(name: &str) -> bool {
    name == LATITUDE_COLUMN || name == LONGITUDE_COLUMN
}

// ============================================================================
// Core Types
// ============================================================================

/// A log file after reshaping
#[derive(Clone, Debug)]
pub struct LoadedFile {
    /// Path to the original file
    pub path: PathBuf,
    /// Display name for the file (file name with extension)
    pub name: String,
    /// Number of long-format records read
    pub record_count: usize,
    pub table: WideTable,
}

impl LoadedFile {
    pub fn new(path: PathBuf, record_count: usize, table: WideTable) -> Self {
        let name = display_name(&path);
        Self {
            path,
            name,
            record_count,
            table,
        }
    }

    /// File name without extension, used for per-file output directories
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }
}

/// File name of a path for display, falling back on the full path
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Every reshaped file of a run, keyed by file name.
///
/// Built once by [`Dataset::from_files`] and never mutated afterwards.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    files: BTreeMap<String, LoadedFile>,
    channel_names: BTreeSet<String>,
}

impl Dataset {
    /// Fold loaded files into a dataset, accumulating the union of channels
    pub fn from_files<I>(files: I) -> Self
    where
        I: IntoIterator<Item = LoadedFile>,
    {
        files
            .into_iter()
            .fold(Self::default(), |mut dataset, file| {
                dataset
                    .channel_names
                    .extend(file.table.column_names().map(str::to_string));
                dataset.files.insert(file.name.clone(), file);
                dataset
            })
    }

    /// Files sorted by name
    pub fn files(&self) -> impl Iterator<Item = &LoadedFile> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Union of column names over all files, sorted
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channel_names.iter().map(String::as_str)
    }

    /// Sensor channels only (derived GPS columns excluded)
    pub fn sensor_channels(&self) -> impl Iterator<Item = &str> {
        self.channel_names().filter(|c| !is_coordinate_column(c))
    }

    /// Concatenate the (longitude, latitude, value) triples `extract` yields
    /// for every file. Files whose lookup fails are returned alongside.
    pub fn geo_aggregate<F>(
        &self,
        extract: F,
    ) -> (Vec<(f64, f64, f64)>, Vec<(&LoadedFile, MissingChannel)>)
    where
        F: Fn(&WideTable) -> Result<Vec<(f64, f64, f64)>, MissingChannel>,
    {
        let mut points = Vec::new();
        let mut missing = Vec::new();
        for file in self.files() {
            match extract(&file.table) {
                Ok(mut p) => points.append(&mut p),
                Err(err) => missing.push((file, err)),
            }
        }
        (points, missing)
    }
}
