//! Per-task comparison figures: one chart per metric, one line per group.

use super::{draw_chart_on, draw_line_chart, mean_curve, rgb, sanitize, smooth, ChartText, Curve, PlotFactory, PlotRequest};
use anyhow::{Context, Result};
use plotters::prelude::*;
use std::path::PathBuf;
use tracing::debug;

/// Metrics a task is primarily judged on, plotted first and in the overview
#[derive(Debug, Clone, Copy)]
pub struct TaskProfile {
    pub name: &'static str,
    pub key_metrics: &'static [&'static str],
}

const TASK_PROFILES: &[TaskProfile] = &[
    TaskProfile {
        name: "GoToPosition",
        key_metrics: &["reward", "position_error", "success_rate", "episode_length"],
    },
    TaskProfile {
        name: "GoToPose",
        key_metrics: &["reward", "position_error", "heading_error", "success_rate"],
    },
    TaskProfile {
        name: "TrackLinearVelocity",
        key_metrics: &["reward", "linear_velocity_error", "episode_length"],
    },
    TaskProfile {
        name: "TrackLinearAngularVelocity",
        key_metrics: &["reward", "linear_velocity_error", "angular_velocity_error", "episode_length"],
    },
    TaskProfile {
        name: "Rendezvous",
        key_metrics: &["reward", "position_error", "relative_velocity", "success_rate"],
    },
];

impl TaskProfile {
    pub fn lookup(name: &str) -> Option<&'static TaskProfile> {
        TASK_PROFILES.iter().find(|p| p.name == name)
    }
}

/// Comparison plots for all groups of one task
pub struct TaskPlotsFactory<'a> {
    profile: Option<&'static TaskProfile>,
    request: PlotRequest<'a>,
}

impl<'a> TaskPlotsFactory<'a> {
    /// Pick the profile for `name`; unknown tasks plot every numeric column
    pub fn create(name: &str, request: PlotRequest<'a>) -> Self {
        let profile = TaskProfile::lookup(name);
        if profile.is_none() {
            debug!(task = name, "No task profile, plotting all metric columns");
        }
        Self { profile, request }
    }

    /// Metric columns to plot, key metrics first, then the rest in column order
    pub fn metric_columns(&self) -> Vec<String> {
        let x_column = self.request.plot_cfg.x_column.as_str();
        let mut available: Vec<String> = Vec::new();
        for (_, tables) in &self.request.dfs {
            for table in tables.iter() {
                for column in table.numeric_columns() {
                    if column != x_column && !available.iter().any(|c| c == column) {
                        available.push(column.to_string());
                    }
                }
            }
        }

        let mut ordered: Vec<String> = Vec::new();
        if let Some(profile) = self.profile {
            for key in profile.key_metrics {
                if let Some(column) = find_metric(&available, key) {
                    if !ordered.contains(column) {
                        ordered.push(column.clone());
                    }
                }
            }
        }
        for column in available {
            if !ordered.contains(&column) {
                ordered.push(column);
            }
        }
        ordered
    }

    /// One mean curve per group, plus faint per-seed curves when enabled
    fn curves_for(&self, metric: &str) -> Vec<Curve> {
        let cfg = self.request.plot_cfg;
        let x_column = Some(cfg.x_column.as_str());
        let mut curves = Vec::new();

        for (index, (group, tables)) in self.request.dfs.iter().enumerate() {
            let series: Vec<Vec<(f64, f64)>> = tables
                .iter()
                .map(|t| t.series(x_column, metric))
                .filter(|s| !s.is_empty())
                .collect();
            if series.is_empty() {
                continue;
            }

            let color = rgb(cfg, index);
            if cfg.show_individual_runs && series.len() > 1 {
                for run in &series {
                    curves.push(Curve::faint(color, smooth(run, cfg.smoothing_window)));
                }
            }
            let mean = smooth(&mean_curve(&series), cfg.smoothing_window);
            curves.push(Curve::new(cfg.legend_label(index, group), color, mean));
        }

        curves
    }

    fn caption(&self, metric: &str) -> String {
        match self.request.num_envs() {
            Some(n) => format!("{}: {} ({} envs)", self.request.task, metric, n),
            None => format!("{}: {}", self.request.task, metric),
        }
    }

    /// 2x2 grid of the first four metrics
    fn plot_overview(&self, metrics: &[String]) -> Result<Option<PathBuf>> {
        let panels: Vec<(&String, Vec<Curve>)> = metrics
            .iter()
            .map(|m| (m, self.curves_for(m)))
            .filter(|(_, curves)| !curves.is_empty())
            .take(4)
            .collect();
        if panels.len() < 2 {
            return Ok(None);
        }

        let path = self
            .request
            .folder_path
            .join(format!("{}_overview.svg", sanitize(self.request.task)));
        let cfg = self.request.plot_cfg;
        {
            let size = (cfg.width.max(800) * 4 / 3, cfg.height.max(600) * 3 / 2);
            let root = SVGBackend::new(path.as_path(), size).into_drawing_area();
            root.fill(&WHITE)?;

            let areas = root.split_evenly((2, 2));
            for (area, (metric, curves)) in areas.iter().zip(panels.iter()) {
                let text = ChartText {
                    caption: metric.as_str(),
                    x_desc: cfg.x_column.as_str(),
                    y_desc: "",
                };
                draw_chart_on(area, &text, curves, 20)?;
            }

            root.present()?;
        }
        Ok(Some(path))
    }
}

impl PlotFactory for TaskPlotsFactory<'_> {
    fn plot(&self) -> Result<Vec<PathBuf>> {
        let cfg = self.request.plot_cfg;
        let task = sanitize(self.request.task);
        let metrics = self.metric_columns();
        let mut generated = Vec::new();

        for metric in &metrics {
            let curves = self.curves_for(metric);
            if curves.is_empty() {
                debug!(task = %self.request.task, metric = %metric, "No data for metric, skipping");
                continue;
            }

            let path = self
                .request
                .folder_path
                .join(format!("{}_{}.svg", task, sanitize(metric)));
            let caption = self.caption(metric);
            let text = ChartText {
                caption: &caption,
                x_desc: cfg.x_column.as_str(),
                y_desc: metric.as_str(),
            };
            draw_line_chart(&path, (cfg.width, cfg.height), &text, &curves)
                .with_context(|| format!("Failed to plot {}", path.display()))?;
            generated.push(path);
        }

        if let Some(path) = self.plot_overview(&metrics)? {
            generated.push(path);
        }

        Ok(generated)
    }
}

/// Exact column match first, then the first column ending in `/key` or `_key`
fn find_metric<'c>(columns: &'c [String], key: &str) -> Option<&'c String> {
    columns.iter().find(|c| c.as_str() == key).or_else(|| {
        columns.iter().find(|c| {
            c.strip_suffix(key)
                .map(|prefix| prefix.ends_with('/') || prefix.ends_with('_'))
                .unwrap_or(false)
        })
    })
}
