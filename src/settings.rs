//! Run settings persistence.
//!
//! Settings come from an explicit `--config` file (errors are fatal) or from
//! the platform config directory (silently falling back to defaults). CLI
//! flags are applied on top by the binary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::charts::{default_menu, ChartSpec, GeoBounds, PlanOptions, TimeAxis};
use crate::error::ConfigError;
use crate::resample::{DedupPolicy, ReshapeOptions};

/// Smallest image that still leaves room for the plot margins
pub const MIN_IMAGE_WIDTH: u32 = 320;
pub const MIN_IMAGE_HEIGHT: u32 = 240;

/// Settings for one run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Settings file version for migration support
    pub version: u32,
    /// Log file or directory of `*.csv` logs
    pub input: Option<PathBuf>,
    /// Directory the charts are written to
    pub output: PathBuf,
    /// Fixed field delimiter; sniffed when unset
    pub delimiter: Option<char>,
    pub resample_interval_secs: f64,
    pub dedup: DedupPolicy,
    /// Sensor whose rows carry the GPS coordinates
    pub gps_sensor: String,
    pub time_axis: TimeAxis,
    /// Absolute time of elapsed second zero
    pub time_origin: Option<DateTime<Utc>>,
    pub geo_bounds: Option<GeoBounds>,
    pub charts: Vec<ChartSpec>,
    /// Also write every wide table to `<output>/tables/`
    pub export_tables: bool,
    pub image_width: u32,
    pub image_height: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            input: None,
            output: PathBuf::from("plots"),
            delimiter: None,
            resample_interval_secs: 1.0,
            dedup: DedupPolicy::First,
            gps_sensor: "Vehicle speed".to_string(),
            time_axis: TimeAxis::Elapsed,
            time_origin: None,
            geo_bounds: None,
            charts: default_menu(),
            export_tables: false,
            image_width: 1920,
            image_height: 1080,
        }
    }
}

impl Settings {
    /// Get the config directory path for obdplot
    pub fn get_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("obdplot"))
    }

    /// Get the path to the settings JSON file
    pub fn get_settings_path() -> Option<PathBuf> {
        Self::get_config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from the config directory, defaulting on any failure
    pub fn load() -> Self {
        let path = match Self::get_settings_path() {
            Some(p) => p,
            None => return Self::default(),
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Ignoring settings file: {}", e);
                Self::default()
            }
        }
    }

    /// Load settings from an explicit file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to the config directory
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::get_settings_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Save settings as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        std::fs::write(path, content).map_err(write_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.resample_interval_secs.is_finite() && self.resample_interval_secs > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "resample_interval_secs must be positive, got {}",
                self.resample_interval_secs
            )));
        }
        if let Some(c) = self.delimiter {
            if !c.is_ascii() || c == '"' || c == '\n' || c == '\r' {
                return Err(ConfigError::Invalid(format!(
                    "delimiter must be a single ASCII character, got {:?}",
                    c
                )));
            }
        }
        if self.image_width < MIN_IMAGE_WIDTH || self.image_height < MIN_IMAGE_HEIGHT {
            return Err(ConfigError::Invalid(format!(
                "image size must be at least {}x{}",
                MIN_IMAGE_WIDTH, MIN_IMAGE_HEIGHT
            )));
        }
        if let Some(bounds) = self.geo_bounds {
            if !bounds.is_valid() {
                return Err(ConfigError::Invalid(
                    "geo_bounds minimum must be below maximum".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Delimiter as a byte for the CSV reader
    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter
            .filter(char::is_ascii)
            .map(|c| c as u8)
    }

    pub fn reshape_options(&self) -> ReshapeOptions {
        ReshapeOptions {
            interval: self.resample_interval_secs,
            dedup: self.dedup,
            gps_sensor: self.gps_sensor.clone(),
        }
    }

    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            geo_bounds: self.geo_bounds,
        }
    }
}
