//! SVG figure generation for task buckets.
//!
//! A [`PlotRequest`] carries one bucket's tables keyed by group name, the
//! output folder and the shared style. Task figures are built by
//! [`TaskPlotsFactory`], robot figures by [`RobotPlotsFactory`].

pub mod robot;
pub mod task;

pub use robot::{RobotPlotsFactory, RobotProfile};
pub use task::TaskPlotsFactory;

use crate::config::PlotConfig;
use crate::grouper::TaskBucket;
use crate::loader::EnvInfo;
use crate::table::Table;
use anyhow::Result;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

/// Produces figures and returns the paths it wrote
pub trait PlotFactory {
    fn plot(&self) -> Result<Vec<PathBuf>>;
}

/// Inputs shared by task and robot plot factories
#[derive(Debug, Clone)]
pub struct PlotRequest<'a> {
    pub task: &'a str,
    pub dfs: Vec<(&'a str, &'a [Table])>,
    pub trajectories_dfs: Vec<(&'a str, &'a [Table])>,
    pub labels: Vec<(&'a str, &'a [String])>,
    pub env_info: Vec<(&'a str, &'a EnvInfo)>,
    pub folder_path: &'a Path,
    pub plot_cfg: &'a PlotConfig,
}

impl<'a> PlotRequest<'a> {
    pub fn from_bucket(bucket: &'a TaskBucket, folder_path: &'a Path, plot_cfg: &'a PlotConfig) -> Self {
        Self {
            task: &bucket.task,
            dfs: bucket.dfs(),
            trajectories_dfs: bucket.trajectories_dfs(),
            labels: bucket.labels(),
            env_info: bucket.env_info(),
            folder_path,
            plot_cfg,
        }
    }

    /// `num_envs` from the first group's env_info, if present
    pub fn num_envs(&self) -> Option<u64> {
        self.env_info
            .iter()
            .find_map(|(_, info)| info.get("num_envs").and_then(|v| v.as_u64()))
    }
}

/// One line on a chart
#[derive(Debug, Clone)]
pub(crate) struct Curve {
    pub label: Option<String>,
    pub color: RGBColor,
    pub points: Vec<(f64, f64)>,
    /// Faint lines are drawn thin and translucent
    pub faint: bool,
}

impl Curve {
    pub fn new(label: impl Into<String>, color: RGBColor, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: Some(label.into()),
            color,
            points,
            faint: false,
        }
    }

    pub fn faint(color: RGBColor, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: None,
            color,
            points,
            faint: true,
        }
    }
}

/// Axis titles and caption for a chart
pub(crate) struct ChartText<'a> {
    pub caption: &'a str,
    pub x_desc: &'a str,
    pub y_desc: &'a str,
}

/// Write a single line chart to `path`
pub(crate) fn draw_line_chart<P: AsRef<Path>>(
    path: P,
    size: (u32, u32),
    text: &ChartText,
    curves: &[Curve],
) -> Result<()> {
    let root = SVGBackend::new(path.as_ref(), size).into_drawing_area();
    root.fill(&WHITE)?;
    draw_chart_on(&root, text, curves, 30)?;
    root.present()?;
    Ok(())
}

/// Draw a chart into an existing drawing area
pub(crate) fn draw_chart_on<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    text: &ChartText,
    curves: &[Curve],
    caption_size: u32,
) -> Result<()> {
    let (x_range, y_range) = axis_ranges(curves);

    let mut chart = ChartBuilder::on(area)
        .caption(text.caption, ("sans-serif", caption_size))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| anyhow::anyhow!("Failed to build chart '{}': {}", text.caption, e))?;

    chart
        .configure_mesh()
        .x_desc(text.x_desc)
        .y_desc(text.y_desc)
        .draw()
        .map_err(|e| anyhow::anyhow!("Failed to draw mesh: {}", e))?;

    // Faint lines first so the labelled ones sit on top
    let ordered = curves.iter().filter(|c| c.faint).chain(curves.iter().filter(|c| !c.faint));
    for curve in ordered {
        let color = curve.color;
        let style = if curve.faint {
            ShapeStyle::from(&color.mix(0.3)).stroke_width(1)
        } else {
            ShapeStyle::from(&color).stroke_width(2)
        };
        let series = chart
            .draw_series(LineSeries::new(curve.points.iter().copied(), style))
            .map_err(|e| anyhow::anyhow!("Failed to draw series: {}", e))?;
        if let Some(label) = &curve.label {
            series
                .label(label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }
    }

    if curves.iter().any(|c| c.label.is_some()) {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperRight)
            .draw()
            .map_err(|e| anyhow::anyhow!("Failed to draw legend: {}", e))?;
    }

    Ok(())
}

/// Data bounds over all curves, padded, and never zero-width
pub(crate) fn axis_ranges(curves: &[Curve]) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let points = || curves.iter().flat_map(|c| c.points.iter());
    let (mut x_min, mut x_max) = bounds(points().map(|p| p.0));
    let (mut y_min, mut y_max) = bounds(points().map(|p| p.1));

    if x_max - x_min < f64::EPSILON {
        x_min -= 0.5;
        x_max += 0.5;
    }
    if y_max - y_min < f64::EPSILON {
        y_min -= 0.5;
        y_max += 0.5;
    }
    let pad = (y_max - y_min) * 0.05;
    (x_min..x_max, (y_min - pad)..(y_max + pad))
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min > max {
        (0.0, 1.0)
    } else {
        (min, max)
    }
}

/// Mean over several series, aligned on x.
///
/// Each x present in any series gets the mean of the series that have a
/// value there, so a gap in one seed does not shift the others.
pub(crate) fn mean_curve(series: &[Vec<(f64, f64)>]) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = series.iter().flatten().copied().collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut out: Vec<(f64, f64)> = Vec::new();
    let mut count = 0usize;
    let mut sum = 0.0;
    for (x, y) in points {
        match out.last_mut() {
            Some(last) if last.0 == x => {
                sum += y;
                count += 1;
                last.1 = sum / count as f64;
            }
            _ => {
                sum = y;
                count = 1;
                out.push((x, y));
            }
        }
    }
    out
}

/// Trailing moving average; a window of 0 or 1 returns the input
pub(crate) fn smooth(points: &[(f64, f64)], window: usize) -> Vec<(f64, f64)> {
    if window <= 1 {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity(points.len());
    let mut sum = 0.0;
    for (i, &(x, y)) in points.iter().enumerate() {
        sum += y;
        if i >= window {
            sum -= points[i - window].1;
        }
        let n = (i + 1).min(window) as f64;
        out.push((x, sum / n));
    }
    out
}

/// File-name-safe form of a metric or task name
pub(crate) fn sanitize(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();
    while out.contains("__") {
        out = out.replace("__", "_");
    }
    out.trim_matches('_').to_string()
}

pub(crate) fn rgb(plot_cfg: &PlotConfig, index: usize) -> RGBColor {
    let (r, g, b) = plot_cfg.color(index);
    RGBColor(r, g, b)
}
