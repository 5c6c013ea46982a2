//! obdplot - OBD-II log resampler and chart renderer
//!
//! This library reads delimited OBD-II diagnostics logs, resamples every
//! sensor onto a uniform time grid with forward fill, joins the sensors into
//! one wide table per file and renders a configurable chart menu to PNG.
//!
//! ## Module Structure
//!
//! - [`parsers`] - Delimiter sniffing and long-format log parsing
//! - [`resample`] - Per-sensor deduplication, resampling and reshaping
//! - [`table`] - Wide tables, channel lookups and GPS status
//! - [`state`] - Loaded files, the dataset and the colour palette
//! - [`analysis`] - Statistics and derived series for the chart menu
//! - [`charts`] - Chart menu types and chart planning
//! - [`export`] - PNG rendering and wide-table CSV export
//! - [`pipeline`] - Batch driver from input discovery to report
//! - [`report`] - Run summary
//! - [`settings`] - Run settings persistence
//! - [`error`] - Error types

pub mod analysis;
pub mod charts;
pub mod error;
pub mod export;
pub mod parsers;
pub mod pipeline;
pub mod report;
pub mod resample;
pub mod settings;
pub mod state;
pub mod table;
