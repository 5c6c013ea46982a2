//! Batch driver: discover, ingest, reshape, export, render, report.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::charts::plan_charts;
use crate::error::{FileError, PipelineError};
use crate::export::{export_table, render_chart, RenderOptions};
use crate::parsers::ObdCsv;
use crate::report::{Failure, FileSummary, RunReport};
use crate::resample::{reshape, validate_interval};
use crate::settings::Settings;
use crate::state::{display_name, Dataset, LoadedFile, LOG_EXTENSION};

/// Every `*.csv` in a directory (sorted by name), or the single file given
pub fn discover_inputs(input: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    if !input.exists() {
        return Err(PipelineError::MissingInput(input.to_path_buf()));
    }
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let escaped = glob::Pattern::escape(&input.to_string_lossy());
    let pattern = format!("{}/*.{}", escaped, LOG_EXTENSION);

    let mut paths = Vec::new();
    for entry in glob::glob(&pattern)? {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!("Could not read path from glob pattern: {}", e),
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(PipelineError::EmptyInput(input.to_path_buf()));
    }
    Ok(paths)
}

/// Ingest and reshape one file
pub fn load_file(path: &Path, settings: &Settings) -> Result<LoadedFile, FileError> {
    let table = ObdCsv::load(path, settings.delimiter_byte())?;
    let wide = reshape(&table, &settings.reshape_options())?;

    if !wide.gps.is_attached() {
        tracing::warn!("{}: {}", display_name(path), wide.gps);
    }

    Ok(LoadedFile::new(path.to_path_buf(), table.records.len(), wide))
}

/// Run the whole batch described by `settings`.
///
/// Per-file and per-chart failures land in the report; only discovery,
/// an invalid interval and an unusable output directory abort.
pub fn run(settings: &Settings) -> Result<RunReport, PipelineError> {
    validate_interval(settings.resample_interval_secs)?;
    let input = settings.input.as_deref().ok_or(PipelineError::NoInput)?;
    let inputs = discover_inputs(input)?;
    tracing::info!("Found {} input file(s) in {}", inputs.len(), input.display());

    let mut report = RunReport::default();
    let mut loaded = Vec::with_capacity(inputs.len());
    for path in &inputs {
        match load_file(path, settings) {
            Ok(file) => loaded.push(file),
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                report.skipped_files.push(Failure {
                    name: display_name(path),
                    reason: e.to_string(),
                });
            }
        }
    }

    let dataset = Dataset::from_files(loaded);
    report.files = dataset.files().map(FileSummary::from_file).collect();

    std::fs::create_dir_all(&settings.output).map_err(|source| PipelineError::Output {
        path: settings.output.clone(),
        source,
    })?;

    if settings.export_tables {
        export_tables(&dataset, settings, &mut report);
    }

    let plan = plan_charts(&dataset, &settings.charts, &settings.plan_options());
    report.chart_skips = plan.skips;

    let options = RenderOptions {
        width: settings.image_width,
        height: settings.image_height,
        time_axis: settings.time_axis,
        time_origin: settings.time_origin,
    };
    let rendered: Vec<_> = plan
        .jobs
        .par_iter()
        .map(|job| (job, render_chart(job, &settings.output, &options)))
        .collect();

    for (job, result) in rendered {
        match result {
            Ok(path) => report.charts.push(path),
            Err(e) => {
                tracing::warn!("Failed to render {}: {}", job.title, e);
                report.chart_failures.push(Failure {
                    name: job.title.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        "Finished: {} chart(s), {} skip(s)",
        report.charts.len(),
        report.chart_skips.len()
    );
    Ok(report)
}

fn export_tables(dataset: &Dataset, settings: &Settings, report: &mut RunReport) {
    let dir = settings.output.join("tables");
    for file in dataset.files() {
        let path = dir.join(format!("{}.csv", file.stem()));
        match export_table(&file.table, &path, settings.time_origin) {
            Ok(()) => report.tables.push(path),
            Err(e) => {
                tracing::warn!("Failed to export {}: {}", file.name, e);
                report.chart_failures.push(Failure {
                    name: file.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
}
