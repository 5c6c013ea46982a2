//! PNG and CSV export.
//!
//! Charts are rasterised straight into an [`RgbaImage`]: a dark background,
//! a slightly lighter plot area, tick marks with faint grid lines, and the
//! data drawn as polylines, point clouds or heat-coloured map points.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use image::{Rgba, RgbaImage};

use crate::analysis::statistics::value_bounds;
use crate::charts::{ChartData, ChartJob, GeoBounds, Series, TimeAxis};
use crate::error::ChartError;
use crate::table::WideTable;

const BACKGROUND: Rgba<u8> = Rgba([30, 30, 30, 255]);
const PLOT_BACKGROUND: Rgba<u8> = Rgba([40, 40, 40, 255]);
const GRID_COLOR: Rgba<u8> = Rgba([60, 60, 60, 255]);
const TICK_COLOR: Rgba<u8> = Rgba([160, 160, 160, 255]);
const TICK_LENGTH: u32 = 8;
/// Upper bound on ticks per axis
const MAX_TICKS: f64 = 10.0;

/// Image-wide rendering parameters
#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub time_axis: TimeAxis,
    pub time_origin: Option<DateTime<Utc>>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            time_axis: TimeAxis::Elapsed,
            time_origin: None,
        }
    }
}

/// Pixel rectangle the data is drawn into
#[derive(Clone, Copy, Debug)]
struct PlotArea {
    left: u32,
    right: u32,
    top: u32,
    bottom: u32,
}

impl PlotArea {
    fn new(width: u32, height: u32) -> Self {
        Self {
            left: 80,
            right: width.saturating_sub(40),
            top: 60,
            bottom: height.saturating_sub(80),
        }
    }

    fn x(&self, scale: &Scale, value: f64) -> u32 {
        let span = (self.right - self.left) as f64;
        (self.left as f64 + scale.ratio(value) * span).round() as u32
    }

    fn y(&self, scale: &Scale, value: f64) -> u32 {
        let span = (self.bottom - self.top) as f64;
        (self.bottom as f64 - scale.ratio(value) * span).round() as u32
    }
}

/// Linear data range of one axis
#[derive(Clone, Copy, Debug, PartialEq)]
struct Scale {
    min: f64,
    max: f64,
}

impl Scale {
    /// Widen degenerate ranges so a constant series still maps somewhere
    fn new(min: f64, max: f64) -> Self {
        if (max - min).abs() < 0.0001 {
            Self {
                min: min - 0.5,
                max: max + 0.5,
            }
        } else {
            Self { min, max }
        }
    }

    fn ratio(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Render one planned chart below `output_dir`, returning the written path
pub fn render_chart(
    job: &ChartJob,
    output_dir: &Path,
    options: &RenderOptions,
) -> Result<PathBuf, ChartError> {
    let path = output_dir.join(&job.file_name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ChartError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut imgbuf = blank_image(options.width, options.height);
    let area = PlotArea::new(options.width, options.height);

    match &job.data {
        ChartData::Lines { series, origin } => {
            let origin = options.time_origin.or(*origin);
            draw_lines(&mut imgbuf, area, series, options.time_axis, origin)
        }
        ChartData::Scatter { series } => draw_scatter(&mut imgbuf, area, series),
        ChartData::Geo {
            points,
            bounds,
            color_range,
        } => draw_geo(&mut imgbuf, area, points, bounds, *color_range),
    }

    imgbuf.save(&path).map_err(|source| ChartError::Image {
        path: path.clone(),
        source,
    })?;

    tracing::info!("Wrote {}", path.display());
    Ok(path)
}

fn blank_image(width: u32, height: u32) -> RgbaImage {
    let mut imgbuf = RgbaImage::from_pixel(width, height, BACKGROUND);
    let area = PlotArea::new(width, height);
    for y in area.top..area.bottom {
        for x in area.left..area.right {
            imgbuf.put_pixel(x, y, PLOT_BACKGROUND);
        }
    }
    imgbuf
}

fn series_scales(series: &[Series]) -> Option<(Scale, Scale)> {
    let points = || series.iter().flat_map(|s| s.points.iter());
    let (x_min, x_max) = value_bounds(points().map(|p| p.0))?;
    let (y_min, y_max) = value_bounds(points().map(|p| p.1))?;
    Some((Scale::new(x_min, x_max), Scale::new(y_min, y_max)))
}

fn draw_lines(
    imgbuf: &mut RgbaImage,
    area: PlotArea,
    series: &[Series],
    time_axis: TimeAxis,
    origin: Option<DateTime<Utc>>,
) {
    let Some((x_scale, y_scale)) = series_scales(series) else {
        return;
    };

    let x_ticks = match time_axis {
        TimeAxis::Elapsed => linear_ticks(x_scale.min, x_scale.max),
        TimeAxis::WallClock => wall_clock_ticks(x_scale.min, x_scale.max, origin),
    };
    draw_axes(imgbuf, area, &x_scale, &x_ticks, &y_scale);

    for s in series {
        let color = Rgba([s.color[0], s.color[1], s.color[2], 255]);
        let mut prev: Option<(u32, u32)> = None;
        for &(t, v) in &s.points {
            let point = (area.x(&x_scale, t), area.y(&y_scale, v));
            match prev {
                Some((px, py)) => draw_line(imgbuf, px, py, point.0, point.1, color),
                None => imgbuf.put_pixel(point.0, point.1, color),
            }
            prev = Some(point);
        }
    }
}

fn draw_scatter(imgbuf: &mut RgbaImage, area: PlotArea, series: &[Series]) {
    let Some((x_scale, y_scale)) = series_scales(series) else {
        return;
    };
    let x_ticks = linear_ticks(x_scale.min, x_scale.max);
    draw_axes(imgbuf, area, &x_scale, &x_ticks, &y_scale);

    for s in series {
        let color = Rgba([s.color[0], s.color[1], s.color[2], 255]);
        for &(x, y) in &s.points {
            draw_point(imgbuf, area.x(&x_scale, x), area.y(&y_scale, y), color);
        }
    }
}

fn draw_geo(
    imgbuf: &mut RgbaImage,
    area: PlotArea,
    points: &[(f64, f64, f64)],
    bounds: &GeoBounds,
    color_range: (f64, f64),
) {
    // Leave room on the right for the colour legend
    let legend_width = 60u32;
    let map_area = PlotArea {
        right: area.right.saturating_sub(legend_width),
        ..area
    };

    let x_scale = Scale::new(bounds.min_lon, bounds.max_lon);
    let y_scale = Scale::new(bounds.min_lat, bounds.max_lat);
    let x_ticks = linear_ticks(x_scale.min, x_scale.max);
    draw_axes(imgbuf, map_area, &x_scale, &x_ticks, &y_scale);

    let value_scale = Scale::new(color_range.0, color_range.1);
    for &(lon, lat, value) in points {
        let color = get_png_heat_color(value_scale.ratio(value));
        draw_point(imgbuf, map_area.x(&x_scale, lon), map_area.y(&y_scale, lat), color);
    }

    // Colour scale legend
    let legend_left = map_area.right + 20;
    let legend_bar_width = 20u32;
    let legend_height = area.bottom - area.top;
    for i in 0..legend_height {
        let color = get_png_heat_color(i as f64 / legend_height as f64);
        for px in 0..legend_bar_width {
            let x = legend_left + px;
            let y = area.bottom - i;
            if x < imgbuf.width() && y < imgbuf.height() {
                imgbuf.put_pixel(x, y, color);
            }
        }
    }
}

/// Grid lines and tick marks along the bottom and left edges
fn draw_axes(
    imgbuf: &mut RgbaImage,
    area: PlotArea,
    x_scale: &Scale,
    x_ticks: &[f64],
    y_scale: &Scale,
) {
    for &tick in x_ticks {
        let x = area.x(x_scale, tick);
        for y in area.top..area.bottom {
            imgbuf.put_pixel(x.min(area.right - 1), y, GRID_COLOR);
        }
        for y in area.bottom..(area.bottom + TICK_LENGTH).min(imgbuf.height()) {
            imgbuf.put_pixel(x.min(area.right - 1), y, TICK_COLOR);
        }
    }

    for tick in linear_ticks(y_scale.min, y_scale.max) {
        let y = area.y(y_scale, tick).min(area.bottom - 1);
        for x in area.left..area.right {
            imgbuf.put_pixel(x, y, GRID_COLOR);
        }
        for x in area.left.saturating_sub(TICK_LENGTH)..area.left {
            imgbuf.put_pixel(x, y, TICK_COLOR);
        }
    }
}

/// Filled 3x3 marker, clipped to the image
fn draw_point(imgbuf: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>) {
    let (width, height) = imgbuf.dimensions();
    for py in y.saturating_sub(1)..=(y + 1) {
        for px in x.saturating_sub(1)..=(x + 1) {
            if px < width && py < height {
                imgbuf.put_pixel(px, py, color);
            }
        }
    }
}

/// Smallest 1/2/5 x 10^n step giving at most [`MAX_TICKS`] ticks over `span`
fn nice_step(span: f64) -> f64 {
    let raw = span / MAX_TICKS;
    let magnitude = 10f64.powf(raw.log10().floor());
    [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|step| span / step <= MAX_TICKS)
        .unwrap_or(10.0 * magnitude)
}

/// Multiples of a round step inside `[min, max]`
pub fn linear_ticks(min: f64, max: f64) -> Vec<f64> {
    let span = max - min;
    if !(span.is_finite() && span > 0.0) {
        return vec![min];
    }
    let step = nice_step(span);
    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

/// Elapsed-second positions of whole-minute wall-clock boundaries.
///
/// Elapsed `t` is the instant `origin + t`; without an origin the Unix epoch
/// is used, which puts ticks on whole minutes of elapsed time.
pub fn wall_clock_ticks(min: f64, max: f64, origin: Option<DateTime<Utc>>) -> Vec<f64> {
    const MINUTE_STEPS: &[f64] = &[1.0, 2.0, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0, 360.0, 720.0];

    let span = max - min;
    if !(span.is_finite() && span >= 0.0) {
        return Vec::new();
    }
    let origin_secs = origin
        .map(|o| o.timestamp() as f64 + o.timestamp_subsec_nanos() as f64 / 1e9)
        .unwrap_or(0.0);

    let minutes = MINUTE_STEPS
        .iter()
        .copied()
        .find(|m| span / (m * 60.0) <= MAX_TICKS)
        .unwrap_or(1440.0);
    let step = minutes * 60.0;

    let first = ((origin_secs + min) / step).ceil() as i64;
    let last = ((origin_secs + max) / step).floor() as i64;
    (first..=last)
        .map(|k| k as f64 * step - origin_secs)
        .collect()
}

/// Get a PNG color from the heat map gradient based on normalized value (0-1)
pub fn get_png_heat_color(normalized: f64) -> Rgba<u8> {
    const HEAT_COLORS: &[[u8; 3]] = &[
        [0, 0, 80],    // Dark blue (0.0)
        [0, 0, 180],   // Blue
        [0, 100, 255], // Light blue
        [0, 200, 255], // Cyan
        [0, 255, 200], // Cyan-green
        [0, 255, 100], // Green
        [100, 255, 0], // Yellow-green
        [200, 255, 0], // Yellow
        [255, 200, 0], // Orange
        [255, 100, 0], // Red-orange
        [255, 0, 0],   // Red (1.0)
    ];

    let t = normalized.clamp(0.0, 1.0);
    let scaled = t * (HEAT_COLORS.len() - 1) as f64;
    let idx = scaled.floor() as usize;
    let frac = scaled - idx as f64;

    if idx >= HEAT_COLORS.len() - 1 {
        let c = HEAT_COLORS[HEAT_COLORS.len() - 1];
        return Rgba([c[0], c[1], c[2], 255]);
    }

    let c1 = HEAT_COLORS[idx];
    let c2 = HEAT_COLORS[idx + 1];

    let r = (c1[0] as f64 + (c2[0] as f64 - c1[0] as f64) * frac) as u8;
    let g = (c1[1] as f64 + (c2[1] as f64 - c1[1] as f64) * frac) as u8;
    let b = (c1[2] as f64 + (c2[2] as f64 - c1[2] as f64) * frac) as u8;

    Rgba([r, g, b, 255])
}

/// Draw a line between two points using Bresenham's algorithm
fn draw_line(img: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgba<u8>) {
    let dx = (x1 as i32 - x0 as i32).abs();
    let dy = -(y1 as i32 - y0 as i32).abs();
    let sx: i32 = if x0 < x1 { 1 } else { -1 };
    let sy: i32 = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0 as i32;
    let mut y = y0 as i32;

    let (width, height) = img.dimensions();

    loop {
        if x >= 0 && x < width as i32 && y >= 0 && y < height as i32 {
            img.put_pixel(x as u32, y as u32, color);
        }

        if x == x1 as i32 && y == y1 as i32 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

// ============================================================================
// Wide-table CSV export
// ============================================================================

/// Write a wide table as CSV: `SECONDS`, `TIMESTAMP`, then one column per
/// channel. Absent cells are left empty.
///
/// Timestamps count from `origin`, or from the file's own start when no
/// origin is given. `TIMESTAMP` is omitted if that start is out of range.
pub fn export_table(
    table: &WideTable,
    path: &Path,
    origin: Option<DateTime<Utc>>,
) -> Result<(), ChartError> {
    let origin = origin.or_else(|| table.start_time());
    let table_err = |source| ChartError::Table {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ChartError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(table_err)?;

    let mut header = vec!["SECONDS".to_string()];
    if origin.is_some() {
        header.push("TIMESTAMP".to_string());
    }
    header.extend(table.column_names().map(str::to_string));
    writer.write_record(&header).map_err(table_err)?;

    for (row, &t) in table.times.iter().enumerate() {
        let mut record = vec![t.to_string()];
        if let Some(origin) = origin {
            let instant = origin + chrono::Duration::microseconds((t * 1e6).round() as i64);
            record.push(instant.to_rfc3339_opts(SecondsFormat::Millis, true));
        }
        record.extend(
            table
                .columns
                .iter()
                .map(|c| c.values[row].map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record).map_err(table_err)?;
    }

    writer.flush().map_err(|e| table_err(csv::Error::from(e)))?;
    Ok(())
}
