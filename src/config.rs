//! Experiment file: which groups and runs to plot, and how.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default destination for generated figures
pub const DEFAULT_OUTPUT_DIR: &str = "/workspace/isaaclab/source/plots/orbital_control";

/// File names expected inside a run directory
pub const METRICS_FILE: &str = "metrics.csv";
pub const TRAJECTORIES_FILE: &str = "trajectories.csv";
pub const ENV_INFO_FILE: &str = "env_info.yaml";

/// Top-level experiment declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub plot: PlotConfig,
    pub groups: Vec<GroupSpec>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

/// Shared style settings handed to every plot factory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Group colors as `#rrggbb`, cycled by group position
    pub colors: Vec<String>,
    /// Legend overrides by group position
    pub run_names: Vec<String>,
    pub width: u32,
    pub height: u32,
    /// Draw each seed as a faint line behind the mean
    pub show_individual_runs: bool,
    /// Trailing moving-average window (1 disables smoothing)
    pub smoothing_window: usize,
    /// Column used as the x axis of metric plots
    pub x_column: String,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            colors: [
                "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2",
                "#7f7f7f", "#bcbd22", "#17becf",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            run_names: Vec::new(),
            width: 1200,
            height: 600,
            show_individual_runs: true,
            smoothing_window: 1,
            x_column: "step".to_string(),
        }
    }
}

impl PlotConfig {
    /// Color for the group at `index`, as RGB
    pub fn color(&self, index: usize) -> (u8, u8, u8) {
        if self.colors.is_empty() {
            return (0, 0, 0);
        }
        parse_hex_color(&self.colors[index % self.colors.len()]).unwrap_or((0, 0, 0))
    }

    /// Legend label for the group at `index`
    pub fn legend_label<'a>(&'a self, index: usize, group_name: &'a str) -> &'a str {
        self.run_names
            .get(index)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(group_name)
    }
}

/// One experiment variant: a set of seeds sharing a task and robot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    pub task: String,
    #[serde(default)]
    pub robot: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub runs: Vec<RunSpec>,
}

fn enabled_by_default() -> bool {
    true
}

/// A run as written in the experiment file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSpec {
    /// Run directory holding the three standard files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trajectories: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_info: Option<PathBuf>,
}

/// Fully resolved file triple for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFiles {
    pub metrics: PathBuf,
    pub trajectories: PathBuf,
    pub env_info: PathBuf,
}

impl RunSpec {
    /// Resolve to concrete paths, with relative paths taken from `base`
    pub fn resolve(&self, base: &Path) -> Result<RunFiles, String> {
        let from_dir = |file: &str| self.dir.as_ref().map(|d| d.join(file));

        let metrics = self
            .metrics
            .clone()
            .or_else(|| from_dir(METRICS_FILE))
            .ok_or_else(|| "missing 'metrics' (or 'dir')".to_string())?;
        let trajectories = self
            .trajectories
            .clone()
            .or_else(|| from_dir(TRAJECTORIES_FILE))
            .ok_or_else(|| "missing 'trajectories' (or 'dir')".to_string())?;
        let env_info = self
            .env_info
            .clone()
            .or_else(|| from_dir(ENV_INFO_FILE))
            .ok_or_else(|| "missing 'env_info' (or 'dir')".to_string())?;

        Ok(RunFiles {
            metrics: base.join(metrics),
            trajectories: base.join(trajectories),
            env_info: base.join(env_info),
        })
    }
}

/// A validated, enabled group with resolved run paths
#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,
    pub task: String,
    pub robot: String,
    pub runs: Vec<RunFiles>,
}

impl Experiment {
    /// Load an experiment file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Validate the declaration and resolve the enabled groups.
    ///
    /// Relative run paths are joined onto `base`, normally the directory
    /// holding the experiment file.
    pub fn resolve_groups(&self, base: &Path) -> Result<Vec<Group>, ConfigError> {
        for color in &self.plot.colors {
            if parse_hex_color(color).is_none() {
                return Err(ConfigError::InvalidColor(color.clone()));
            }
        }

        let mut seen = HashSet::new();
        let mut groups = Vec::new();

        for spec in self.groups.iter().filter(|g| g.enabled) {
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::DuplicateGroup(spec.name.clone()));
            }
            if spec.runs.is_empty() {
                return Err(ConfigError::EmptyGroup(spec.name.clone()));
            }

            let runs = spec
                .runs
                .iter()
                .map(|run| run.resolve(base))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|reason| ConfigError::InvalidRun {
                    group: spec.name.clone(),
                    reason,
                })?;

            groups.push(Group {
                name: spec.name.clone(),
                task: spec.task.clone(),
                robot: spec.robot.trim().to_string(),
                runs,
            });
        }

        if groups.is_empty() {
            return Err(ConfigError::NoGroups);
        }

        Ok(groups)
    }
}

/// Parse `#rrggbb` into an RGB triple
pub fn parse_hex_color(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}
