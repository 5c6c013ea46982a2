//! Summary of one run: what was read, what was drawn, what was skipped.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::analysis::statistics::{column_stats, DescriptiveStats};
use crate::charts::ChartSkip;
use crate::state::LoadedFile;
use crate::table::GpsStatus;

/// Per-channel summary of one wide table
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChannelSummary {
    pub name: String,
    pub unit: String,
    #[serde(flatten)]
    pub stats: DescriptiveStats,
}

/// One successfully reshaped file
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileSummary {
    pub name: String,
    /// Long-format records read
    pub records: usize,
    /// Rows of the wide table
    pub rows: usize,
    pub gps: GpsStatus,
    pub channels: Vec<ChannelSummary>,
}

impl FileSummary {
    pub fn from_file(file: &LoadedFile) -> Self {
        Self {
            name: file.name.clone(),
            records: file.record_count,
            rows: file.table.row_count(),
            gps: file.table.gps.clone(),
            channels: file
                .table
                .columns
                .iter()
                .map(|c| ChannelSummary {
                    name: c.name.clone(),
                    unit: c.unit.clone(),
                    stats: column_stats(&c.values),
                })
                .collect(),
        }
    }
}

/// A file (or chart) that failed, along with the error message
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Failure {
    pub name: String,
    pub reason: String,
}

/// Everything a run produced
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub files: Vec<FileSummary>,
    pub skipped_files: Vec<Failure>,
    pub charts: Vec<PathBuf>,
    pub chart_skips: Vec<ChartSkip>,
    pub chart_failures: Vec<Failure>,
    pub tables: Vec<PathBuf>,
}

impl RunReport {
    /// Files whose GPS columns could not be attached
    pub fn files_without_gps(&self) -> impl Iterator<Item = &FileSummary> {
        self.files.iter().filter(|f| !f.gps.is_attached())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Processed {} file(s), skipped {}",
            self.files.len(),
            self.skipped_files.len()
        )?;
        for file in &self.files {
            writeln!(
                f,
                "  {}: {} records, {} rows, {} channels",
                file.name,
                file.records,
                file.rows,
                file.channels.len()
            )?;
        }
        for skipped in &self.skipped_files {
            writeln!(f, "  skipped {}: {}", skipped.name, skipped.reason)?;
        }

        let without_gps: Vec<_> = self.files_without_gps().collect();
        if !without_gps.is_empty() {
            writeln!(f, "Files without GPS data:")?;
            for file in without_gps {
                writeln!(f, "  {}: {}", file.name, file.gps)?;
            }
        }

        writeln!(f, "Wrote {} chart(s)", self.charts.len())?;
        if !self.tables.is_empty() {
            writeln!(f, "Exported {} table(s)", self.tables.len())?;
        }
        if !self.chart_skips.is_empty() {
            writeln!(f, "Chart skips:")?;
            for skip in &self.chart_skips {
                writeln!(f, "  {}", skip)?;
            }
        }
        for failure in &self.chart_failures {
            writeln!(f, "  failed {}: {}", failure.name, failure.reason)?;
        }
        Ok(())
    }
}
