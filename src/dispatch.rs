//! Hands each task bucket to the task and robot plot factories.

use crate::config::PlotConfig;
use crate::grouper::TaskBucket;
use crate::plot::{PlotFactory, PlotRequest, RobotPlotsFactory, TaskPlotsFactory};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Renders the figures for one bucket
pub trait PlotRenderer {
    fn render_task(&mut self, request: PlotRequest<'_>) -> Result<Vec<PathBuf>>;
    fn render_robot(&mut self, robot: &str, request: PlotRequest<'_>) -> Result<Vec<PathBuf>>;
}

/// Draws SVG figures with the plot factories
#[derive(Debug, Default)]
pub struct SvgRenderer;

impl PlotRenderer for SvgRenderer {
    fn render_task(&mut self, request: PlotRequest<'_>) -> Result<Vec<PathBuf>> {
        let name = request.task;
        TaskPlotsFactory::create(name, request).plot()
    }

    fn render_robot(&mut self, robot: &str, request: PlotRequest<'_>) -> Result<Vec<PathBuf>> {
        RobotPlotsFactory::create(robot, request)?.plot()
    }
}

/// Outcome of a dispatch pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub tasks_plotted: usize,
    pub robot_plots: usize,
    pub robot_plots_skipped: usize,
    pub failures: usize,
    pub figures: Vec<PathBuf>,
}

/// Plot every bucket in order. Rendering failures are logged and counted.
pub fn dispatch<R: PlotRenderer>(
    renderer: &mut R,
    buckets: &[TaskBucket],
    folder_path: &Path,
    plot_cfg: &PlotConfig,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    for bucket in buckets {
        info!(task = %bucket.task, groups = ?bucket.group_names(), "Plotting task");

        let request = PlotRequest::from_bucket(bucket, folder_path, plot_cfg);
        match renderer.render_task(request) {
            Ok(figures) => {
                report.tasks_plotted += 1;
                report.figures.extend(figures);
            }
            Err(e) => {
                error!(task = %bucket.task, "Task plots failed: {:#}", e);
                report.failures += 1;
            }
        }

        let Some(robot) = bucket.robot.as_deref() else {
            report.robot_plots_skipped += 1;
            continue;
        };

        let request = PlotRequest::from_bucket(bucket, folder_path, plot_cfg);
        match renderer.render_robot(robot, request) {
            Ok(figures) => {
                report.robot_plots += 1;
                report.figures.extend(figures);
            }
            Err(e) => {
                error!(task = %bucket.task, robot, "Robot plots failed: {:#}", e);
                report.failures += 1;
            }
        }
    }

    report
}
