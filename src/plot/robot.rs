//! Robot-specific figures built from trajectory tables.

use super::{draw_line_chart, mean_curve, rgb, sanitize, ChartText, Curve, PlotFactory, PlotRequest};
use crate::table::Table;
use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

/// Environments drawn per group on the trajectory figure
const MAX_ENVS_PER_GROUP: usize = 8;

/// Column layout of a robot's trajectory logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotProfile {
    pub name: &'static str,
    pub x_column: &'static str,
    pub y_column: &'static str,
    /// Prefix shared by every action column
    pub action_prefix: &'static str,
    pub action_desc: &'static str,
}

const ROBOT_PROFILES: &[RobotProfile] = &[
    RobotProfile {
        name: "FloatingPlatform",
        x_column: "pos_x",
        y_column: "pos_y",
        action_prefix: "thruster_",
        action_desc: "Mean thruster activation",
    },
    RobotProfile {
        name: "Kingfisher",
        x_column: "pos_x",
        y_column: "pos_y",
        action_prefix: "thruster_",
        action_desc: "Mean thruster command",
    },
    RobotProfile {
        name: "Turtlebot2",
        x_column: "pos_x",
        y_column: "pos_y",
        action_prefix: "wheel_",
        action_desc: "Mean wheel velocity command",
    },
    RobotProfile {
        name: "Leatherback",
        x_column: "pos_x",
        y_column: "pos_y",
        action_prefix: "action_",
        action_desc: "Mean |throttle, steering|",
    },
];

impl RobotProfile {
    pub fn lookup(name: &str) -> Option<&'static RobotProfile> {
        ROBOT_PROFILES.iter().find(|p| p.name == name)
    }

    pub fn is_known(name: &str) -> bool {
        Self::lookup(name).is_some()
    }

    fn action_columns<'t>(&self, table: &'t Table) -> Vec<&'t str> {
        table
            .columns()
            .iter()
            .map(String::as_str)
            .filter(|c| c.starts_with(self.action_prefix))
            .collect()
    }
}

/// Trajectory and action figures for the robot of one task
pub struct RobotPlotsFactory<'a> {
    profile: &'static RobotProfile,
    request: PlotRequest<'a>,
}

impl<'a> RobotPlotsFactory<'a> {
    /// Fails for robots without a registered profile
    pub fn create(name: &str, request: PlotRequest<'a>) -> Result<Self> {
        let Some(profile) = RobotProfile::lookup(name) else {
            bail!("No plot profile for robot '{}'", name);
        };
        Ok(Self { profile, request })
    }

    fn figure_path(&self, kind: &str) -> PathBuf {
        self.request.folder_path.join(format!(
            "{}_{}_{}.svg",
            sanitize(self.profile.name),
            sanitize(self.request.task),
            kind
        ))
    }

    /// Label of run `run` in `group`, if one was loaded
    fn run_label(&self, group: &str, run: usize) -> Option<&'a str> {
        self.request
            .labels
            .iter()
            .find(|(name, _)| *name == group)
            .and_then(|&(_, labels)| labels.get(run))
            .map(String::as_str)
    }

    /// First run of each group that has the position columns, with its legend text
    fn first_usable_runs(&self) -> Vec<(usize, String, &'a Table)> {
        let cfg = self.request.plot_cfg;
        let mut runs = Vec::new();
        for (index, &(group, tables)) in self.request.trajectories_dfs.iter().enumerate() {
            let found = tables.iter().enumerate().find(|(_, t)| {
                !t.is_empty() && t.has_column(self.profile.x_column) && t.has_column(self.profile.y_column)
            });
            match found {
                Some((run, table)) => {
                    // a run_names override replaces the group name, the run label is kept
                    let legend = match (cfg.run_names.get(index), self.run_label(group, run)) {
                        (Some(name), Some(label)) if !name.is_empty() => {
                            label.replacen(group, name, 1)
                        }
                        (_, Some(label)) => label.to_string(),
                        (_, None) => cfg.legend_label(index, group).to_string(),
                    };
                    runs.push((index, legend, table));
                }
                None => warn!(
                    group = %group,
                    robot = self.profile.name,
                    "No trajectories with {}/{} columns, skipping group",
                    self.profile.x_column,
                    self.profile.y_column
                ),
            }
        }
        runs
    }

    /// XY paths, one line per environment
    pub(crate) fn trajectory_curves(&self) -> Vec<Curve> {
        let cfg = self.request.plot_cfg;
        let mut curves = Vec::new();

        for (index, legend, table) in self.first_usable_runs() {
            let color = rgb(cfg, index);
            let envs: Vec<Table> = if table.has_column("env_id") {
                table
                    .distinct("env_id")
                    .into_iter()
                    .take(MAX_ENVS_PER_GROUP)
                    .map(|env| table.filter_eq("env_id", env))
                    .collect()
            } else {
                vec![table.clone()]
            };

            for (i, env) in envs.iter().enumerate() {
                let points = env.series(Some(self.profile.x_column), self.profile.y_column);
                if points.is_empty() {
                    continue;
                }
                // only the first path of a group goes in the legend
                if i == 0 {
                    curves.push(Curve::new(legend.as_str(), color, points));
                } else {
                    curves.push(Curve::faint(color, points));
                }
            }
        }

        curves
    }

    /// Mean absolute action per step, averaged over each group's runs
    pub(crate) fn action_curves(&self) -> Vec<Curve> {
        let cfg = self.request.plot_cfg;
        let mut curves = Vec::new();

        for (index, (group, tables)) in self.request.trajectories_dfs.iter().enumerate() {
            let series: Vec<Vec<(f64, f64)>> = tables
                .iter()
                .map(|t| self.action_magnitude(t))
                .filter(|s| !s.is_empty())
                .collect();
            if series.is_empty() {
                continue;
            }
            curves.push(Curve::new(
                cfg.legend_label(index, group),
                rgb(cfg, index),
                mean_curve(&series),
            ));
        }

        curves
    }

    /// Per-step mean of |action| over action columns and environments
    fn action_magnitude(&self, table: &Table) -> Vec<(f64, f64)> {
        let columns = self.profile.action_columns(table);
        if columns.is_empty() {
            return Vec::new();
        }
        let x_column = table.has_column("step").then_some("step");

        let mut by_step: BTreeMap<i64, (f64, f64, usize)> = BTreeMap::new();
        for column in &columns {
            for (x, y) in table.series(x_column, column) {
                let entry = by_step.entry(x.round() as i64).or_insert((x, 0.0, 0));
                entry.1 += y.abs();
                entry.2 += 1;
            }
        }

        by_step
            .into_values()
            .map(|(x, sum, count)| (x, sum / count as f64))
            .collect()
    }
}

impl PlotFactory for RobotPlotsFactory<'_> {
    fn plot(&self) -> Result<Vec<PathBuf>> {
        let cfg = self.request.plot_cfg;
        let mut generated = Vec::new();

        let trajectories = self.trajectory_curves();
        if trajectories.is_empty() {
            warn!(task = %self.request.task, robot = self.profile.name, "No trajectory data to plot");
        } else {
            let path = self.figure_path("trajectories");
            let caption = format!("{} trajectories: {}", self.profile.name, self.request.task);
            let text = ChartText {
                caption: &caption,
                x_desc: self.profile.x_column,
                y_desc: self.profile.y_column,
            };
            draw_line_chart(&path, (cfg.height, cfg.height), &text, &trajectories)
                .with_context(|| format!("Failed to plot {}", path.display()))?;
            generated.push(path);
        }

        let actions = self.action_curves();
        if !actions.is_empty() {
            let path = self.figure_path("actions");
            let caption = format!("{} actions: {}", self.profile.name, self.request.task);
            let text = ChartText {
                caption: &caption,
                x_desc: "step",
                y_desc: self.profile.action_desc,
            };
            draw_line_chart(&path, (cfg.width, cfg.height), &text, &actions)
                .with_context(|| format!("Failed to plot {}", path.display()))?;
            generated.push(path);
        }

        Ok(generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlotConfig;
    use tempfile::TempDir;

    fn trajectory() -> Table {
        Table::new(
            vec![
                "step".into(),
                "env_id".into(),
                "pos_x".into(),
                "pos_y".into(),
                "thruster_0".into(),
                "thruster_1".into(),
            ],
            vec![
                vec![Some(0.0), Some(0.0), Some(0.0), Some(0.0), Some(1.0), Some(-1.0)],
                vec![Some(0.0), Some(1.0), Some(1.0), Some(1.0), Some(0.0), Some(0.0)],
                vec![Some(1.0), Some(0.0), Some(0.5), Some(0.5), Some(0.5), Some(0.5)],
                vec![Some(1.0), Some(1.0), Some(1.5), Some(1.5), Some(0.5), Some(-0.5)],
            ],
        )
    }

    fn request<'a>(
        trajectories: Vec<(&'a str, &'a [Table])>,
        folder: &'a std::path::Path,
        cfg: &'a PlotConfig,
    ) -> PlotRequest<'a> {
        PlotRequest {
            task: "GoToPosition",
            dfs: Vec::new(),
            trajectories_dfs: trajectories,
            labels: Vec::new(),
            env_info: Vec::new(),
            folder_path: folder,
            plot_cfg: cfg,
        }
    }

    #[test]
    fn test_unknown_robot_rejected() {
        let dir = TempDir::new().unwrap();
        let cfg = PlotConfig::default();
        assert!(RobotPlotsFactory::create("Submarine", request(Vec::new(), dir.path(), &cfg)).is_err());
        assert!(RobotProfile::is_known("FloatingPlatform"));
        assert!(!RobotProfile::is_known("floatingplatform"));
    }

    #[test]
    fn test_trajectory_curves_split_by_env() {
        let dir = TempDir::new().unwrap();
        let cfg = PlotConfig::default();
        let tables = vec![trajectory()];
        let factory = RobotPlotsFactory::create(
            "FloatingPlatform",
            request(vec![("A", tables.as_slice())], dir.path(), &cfg),
        )
        .unwrap();

        let curves = factory.trajectory_curves();
        assert_eq!(curves.len(), 2);
        assert_eq!(curves[0].label.as_deref(), Some("A"));
        assert_eq!(curves[0].points, vec![(0.0, 0.0), (0.5, 0.5)]);
        assert!(curves[1].faint);
    }

    #[test]
    fn test_trajectory_legend_names_the_plotted_run() {
        let dir = TempDir::new().unwrap();
        let mut cfg = PlotConfig::default();
        let tables = vec![Table::empty(), trajectory()];
        let labels = vec!["A (seed_1)".to_string(), "A (seed_2)".to_string()];
        let mut req = request(vec![("A", tables.as_slice())], dir.path(), &cfg);
        req.labels = vec![("A", labels.as_slice())];
        let factory = RobotPlotsFactory::create("FloatingPlatform", req).unwrap();

        // seed_1 has no trajectories, so the path comes from seed_2
        let curves = factory.trajectory_curves();
        assert_eq!(curves[0].label.as_deref(), Some("A (seed_2)"));

        cfg.run_names = vec!["Wide net".to_string()];
        let mut req = request(vec![("A", tables.as_slice())], dir.path(), &cfg);
        req.labels = vec![("A", labels.as_slice())];
        let factory = RobotPlotsFactory::create("FloatingPlatform", req).unwrap();
        assert_eq!(
            factory.trajectory_curves()[0].label.as_deref(),
            Some("Wide net (seed_2)")
        );
    }

    #[test]
    fn test_action_magnitude_averages_per_step() {
        let dir = TempDir::new().unwrap();
        let cfg = PlotConfig::default();
        let tables = vec![trajectory()];
        let factory = RobotPlotsFactory::create(
            "FloatingPlatform",
            request(vec![("A", tables.as_slice())], dir.path(), &cfg),
        )
        .unwrap();

        let curves = factory.action_curves();
        assert_eq!(curves.len(), 1);
        assert_eq!(curves[0].points, vec![(0.0, 0.5), (1.0, 0.5)]);
    }

    #[test]
    fn test_empty_trajectories_produce_no_figures() {
        let dir = TempDir::new().unwrap();
        let cfg = PlotConfig::default();
        let tables = vec![Table::empty()];
        let factory = RobotPlotsFactory::create(
            "FloatingPlatform",
            request(vec![("A", tables.as_slice())], dir.path(), &cfg),
        )
        .unwrap();
        assert!(factory.plot().unwrap().is_empty());
    }

    #[test]
    fn test_plot_writes_trajectory_and_action_figures() {
        let dir = TempDir::new().unwrap();
        let cfg = PlotConfig::default();
        let tables = vec![trajectory()];
        let factory = RobotPlotsFactory::create(
            "FloatingPlatform",
            request(vec![("A", tables.as_slice())], dir.path(), &cfg),
        )
        .unwrap();

        let generated = factory.plot().unwrap();
        assert_eq!(
            generated,
            vec![
                dir.path().join("FloatingPlatform_GoToPosition_trajectories.svg"),
                dir.path().join("FloatingPlatform_GoToPosition_actions.svg"),
            ]
        );
        assert!(generated.iter().all(|p| p.exists()));
    }
}
