//! Error types for ingestion, reshaping, charting and configuration.
//!
//! Per-file errors ([`IngestError`], [`ReshapeError`]) are collected by the
//! pipeline and reported at the end of a run. Only [`PipelineError`] and
//! [`ConfigError`] stop a run.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Ingestion
// ============================================================================

/// Errors that can occur while reading one log file
#[derive(Debug, Error)]
pub enum IngestError {
    /// Failed to read the file from disk
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No consistent field delimiter in the leading sample
    #[error("Could not determine delimiter: {0}")]
    DelimiterDetection(String),

    /// A required column is missing from the header row
    #[error("Missing required column '{column}'")]
    Schema { column: String },

    /// A numeric column holds something that is not a number
    #[error("Line {line}: column {column} value '{value}' is not a number")]
    TypeConversion {
        column: String,
        line: u64,
        value: String,
    },

    /// The header parsed but there were no records
    #[error("File contains no data rows")]
    EmptyFile,

    /// Malformed CSV (unterminated quote, bad UTF-8, ...)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

// ============================================================================
// Reshaping
// ============================================================================

/// Errors raised while turning a long table into a wide table
#[derive(Debug, Error)]
pub enum ReshapeError {
    /// The resample interval must be a positive, finite number of seconds
    #[error("Invalid resample interval: {0}")]
    InvalidInterval(f64),

    /// The sensor's time span needs more grid ticks than allowed
    #[error("Sensor '{sensor}' spans {ticks} ticks (limit {limit})")]
    TooManyTicks {
        sensor: String,
        ticks: f64,
        limit: usize,
    },
}

/// A requested channel does not exist in a wide table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Channel not present: {channel}")]
pub struct MissingChannel {
    pub channel: String,
}

/// Failure of a single file anywhere between reading and the wide table
#[derive(Debug, Error)]
pub enum FileError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Reshape(#[from] ReshapeError),
}

// ============================================================================
// Charts
// ============================================================================

/// Errors that can occur while rendering one chart
#[derive(Debug, Error)]
pub enum ChartError {
    /// Failed to create the output directory
    #[error("Failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PNG encoding or write failure
    #[error("Failed to write image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to write an exported wide table
    #[error("Failed to export table {path}: {source}")]
    Table {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

// ============================================================================
// Run level
// ============================================================================

/// Errors that stop a whole run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No `*.csv` files matched in the input directory
    #[error("No input files found in {0}")]
    EmptyInput(PathBuf),

    /// Neither the command line nor the settings name an input
    #[error("No input path given")]
    NoInput,

    /// The input path does not exist
    #[error("Input path does not exist: {0}")]
    MissingInput(PathBuf),

    /// The glob pattern built from the input path is invalid
    #[error("Invalid input pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Failed to create the output directory
    #[error("Failed to create output directory {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Reshape(#[from] ReshapeError),
}

/// Errors loading or saving an explicit settings file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid setting: {0}")]
    Invalid(String),

    #[error("Could not determine config directory")]
    NoConfigDir,
}
