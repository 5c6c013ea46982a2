//! obdplot - resample OBD-II logs and render a fixed chart menu to PNG
//!
//! Reads one log file or every `*.csv` of a directory, resamples each sensor
//! onto a 1 s grid and writes the charts into the output directory.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use obdplot::pipeline;
use obdplot::resample::DedupPolicy;
use obdplot::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "obdplot", version, about = "Resample OBD-II logs and render charts")]
struct Cli {
    /// Log file or directory of *.csv logs
    input: Option<PathBuf>,

    /// Directory the charts are written to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Settings file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fixed field delimiter, e.g. ';' (sniffed when omitted)
    #[arg(long)]
    delimiter: Option<char>,

    /// Resample interval in seconds
    #[arg(long)]
    interval: Option<f64>,

    /// Which row wins on duplicate timestamps: first or last
    #[arg(long)]
    dedup: Option<DedupPolicy>,

    /// Also write each wide table as CSV under <output>/tables/
    #[arg(long)]
    export_tables: bool,

    /// Write the run report as JSON
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Write the effective settings to the config directory and exit
    #[arg(long)]
    save_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let subscriber = fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .init();
}

/// Settings file first, command-line flags on top
fn effective_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::load(),
    };

    if let Some(input) = &cli.input {
        settings.input = Some(input.clone());
    }
    if let Some(output) = &cli.output {
        settings.output = output.clone();
    }
    if let Some(delimiter) = cli.delimiter {
        settings.delimiter = Some(delimiter);
    }
    if let Some(interval) = cli.interval {
        settings.resample_interval_secs = interval;
    }
    if let Some(dedup) = cli.dedup {
        settings.dedup = dedup;
    }
    if cli.export_tables {
        settings.export_tables = true;
    }

    settings.validate().context("Invalid settings")?;
    Ok(settings)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let settings = effective_settings(&cli)?;

    if cli.save_config {
        settings.save().context("Failed to save settings")?;
        if let Some(path) = Settings::get_settings_path() {
            println!("Saved settings to {}", path.display());
        }
        return Ok(());
    }

    let report = pipeline::run(&settings).context("Run failed")?;
    print!("{}", report);

    if let Some(path) = &cli.report_json {
        let json = report.to_json().context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    Ok(())
}
