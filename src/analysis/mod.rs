//! Derived series computed from wide tables for the chart menu.
//!
//! Every helper looks channels up through [`WideTable::channel`], so a
//! missing channel surfaces as [`MissingChannel`] for the caller to skip.

pub mod statistics;

use crate::error::MissingChannel;
use crate::table::{WideTable, LATITUDE_COLUMN, LONGITUDE_COLUMN};

use statistics::{first_difference, lagged_difference};

/// Pairs `(against[i], channel[i] - channel[i - lag])` for every row where
/// all three cells are defined
pub fn rate_pairs(
    table: &WideTable,
    channel: &str,
    lag: usize,
    against: &str,
) -> Result<Vec<(f64, f64)>, MissingChannel> {
    let source = table.channel(channel)?;
    let x = table.channel(against)?;
    let diff = lagged_difference(&source.values, lag);

    Ok(x
        .values
        .iter()
        .zip(diff.iter())
        .filter_map(|(x, d)| Some(((*x)?, (*d)?)))
        .collect())
}

/// `(longitude, latitude, Δchannel)` where the row-to-row difference and
/// both coordinates are defined
pub fn geo_difference_points(
    table: &WideTable,
    channel: &str,
) -> Result<Vec<(f64, f64, f64)>, MissingChannel> {
    let lon = table.channel(LONGITUDE_COLUMN)?;
    let lat = table.channel(LATITUDE_COLUMN)?;
    let diff = first_difference(&table.channel(channel)?.values);

    Ok(lon
        .values
        .iter()
        .zip(lat.values.iter())
        .zip(diff.iter())
        .filter_map(|((lon, lat), d)| Some(((*lon)?, (*lat)?, (*d)?)))
        .collect())
}
