//! Reads each run's metrics, trajectories and env_info files.

use crate::config::{Group, RunFiles};
use crate::error::LoadError;
use crate::table::Table;
use std::path::Path;
use tracing::{debug, warn};

/// Environment metadata as read from a run's YAML file
pub type EnvInfo = serde_yaml::Value;

/// Tables and label for a single seed
#[derive(Debug, Clone)]
pub struct LoadedRun {
    pub metrics: Table,
    pub trajectories: Table,
    pub label: String,
}

/// Everything loaded for one group, in run order
#[derive(Debug, Clone)]
pub struct GroupData {
    pub name: String,
    pub task: String,
    pub robot: String,
    pub metrics: Vec<Table>,
    pub trajectories: Vec<Table>,
    pub labels: Vec<String>,
    pub env_info: EnvInfo,
}

/// Load one run. Metrics errors are returned; a missing trajectories file is not.
pub fn load_run(group_name: &str, files: &RunFiles) -> Result<LoadedRun, LoadError> {
    let metrics = Table::from_csv_path(&files.metrics).map_err(|source| LoadError::Metrics {
        path: files.metrics.clone(),
        source,
    })?;
    if !metrics.has_header() {
        return Err(LoadError::MissingHeader(files.metrics.clone()));
    }

    let trajectories = if files.trajectories.exists() {
        Table::from_csv_path(&files.trajectories).map_err(|source| LoadError::Trajectories {
            path: files.trajectories.clone(),
            source,
        })?
    } else {
        warn!(
            path = %files.trajectories.display(),
            group = group_name,
            "Trajectories file not found, using an empty table"
        );
        Table::empty()
    };

    Ok(LoadedRun {
        metrics,
        trajectories,
        label: run_label(group_name, &files.metrics),
    })
}

/// Label combining the group name and the run's folder name
pub fn run_label(group_name: &str, metrics_path: &Path) -> String {
    let folder = metrics_path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if folder.is_empty() {
        group_name.to_string()
    } else {
        format!("{} ({})", group_name, folder)
    }
}

/// Read env_info YAML. Missing or malformed files yield an empty mapping.
pub fn load_env_info<P: AsRef<Path>>(path: P) -> EnvInfo {
    let path = path.as_ref();
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), "Failed to read env_info: {}", e);
            return EnvInfo::Mapping(Default::default());
        }
    };
    match serde_yaml::from_str::<EnvInfo>(&content) {
        Ok(EnvInfo::Null) => EnvInfo::Mapping(Default::default()),
        Ok(info) => info,
        Err(e) => {
            warn!(path = %path.display(), "Failed to parse env_info: {}", e);
            EnvInfo::Mapping(Default::default())
        }
    }
}

/// Load every run of a group. The first metrics failure aborts the group.
pub fn load_group(group: &Group) -> Result<GroupData, LoadError> {
    let mut data = GroupData {
        name: group.name.clone(),
        task: group.task.clone(),
        robot: group.robot.clone(),
        metrics: Vec::with_capacity(group.runs.len()),
        trajectories: Vec::with_capacity(group.runs.len()),
        labels: Vec::with_capacity(group.runs.len()),
        env_info: EnvInfo::Mapping(Default::default()),
    };

    for files in &group.runs {
        let run = load_run(&group.name, files)?;
        debug!(
            label = %run.label,
            metric_rows = run.metrics.row_count(),
            trajectory_rows = run.trajectories.row_count(),
            "Loaded run"
        );
        data.metrics.push(run.metrics);
        data.trajectories.push(run.trajectories);
        data.labels.push(run.label);
    }

    // env_info is shared by all seeds of a group
    if let Some(first) = group.runs.first() {
        data.env_info = load_env_info(&first.env_info);
    }

    Ok(data)
}

/// Load all groups in declaration order, stopping at the first failure
pub fn load_all(groups: &[Group]) -> Result<Vec<GroupData>, LoadError> {
    groups.iter().map(load_group).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_run(dir: &Path, name: &str, metrics: Option<&str>, trajectories: Option<&str>) -> RunFiles {
        let run_dir = dir.join(name);
        fs::create_dir_all(&run_dir).unwrap();
        if let Some(text) = metrics {
            fs::write(run_dir.join("metrics.csv"), text).unwrap();
        }
        if let Some(text) = trajectories {
            fs::write(run_dir.join("trajectories.csv"), text).unwrap();
        }
        RunFiles {
            metrics: run_dir.join("metrics.csv"),
            trajectories: run_dir.join("trajectories.csv"),
            env_info: run_dir.join("env_info.yaml"),
        }
    }

    #[test]
    fn test_missing_trajectories_gives_empty_table() {
        let dir = TempDir::new().unwrap();
        let files = write_run(dir.path(), "seed_1", Some("step,reward\n0,1\n"), None);

        let run = load_run("Expert 32x32_GoToPosition", &files).unwrap();
        assert!(run.trajectories.is_empty());
        assert!(!run.trajectories.has_header());
        assert_eq!(run.metrics.row_count(), 1);
        assert_eq!(run.label, "Expert 32x32_GoToPosition (seed_1)");
    }

    #[test]
    fn test_missing_metrics_is_an_error() {
        let dir = TempDir::new().unwrap();
        let files = write_run(dir.path(), "seed_1", None, Some("step,x\n0,0\n"));

        let err = load_run("A", &files).unwrap_err();
        assert!(matches!(err, LoadError::Metrics { .. }));
        assert_eq!(err.path(), &files.metrics);
    }

    #[test]
    fn test_malformed_metrics_is_an_error() {
        let dir = TempDir::new().unwrap();
        let files = write_run(dir.path(), "seed_1", Some("step,reward\n0,1\n1,2,3\n"), None);
        assert!(matches!(load_run("A", &files), Err(LoadError::Metrics { .. })));
    }

    #[test]
    fn test_empty_metrics_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let files = write_run(dir.path(), "seed_1", Some(""), None);
        assert!(matches!(load_run("A", &files), Err(LoadError::MissingHeader(_))));
    }

    #[test]
    fn test_run_label_without_folder() {
        assert_eq!(run_label("A", Path::new("metrics.csv")), "A");
        assert_eq!(run_label("A", &PathBuf::from("/logs/seed_7/metrics.csv")), "A (seed_7)");
    }

    #[test]
    fn test_env_info_loaded_once_from_first_run() {
        let dir = TempDir::new().unwrap();
        let first = write_run(dir.path(), "seed_1", Some("step\n0\n"), Some("step\n0\n"));
        let second = write_run(dir.path(), "seed_2", Some("step\n0\n"), Some("step\n0\n"));
        fs::write(&first.env_info, "robot: FloatingPlatform\nnum_envs: 64\n").unwrap();
        fs::write(&second.env_info, "robot: Other\n").unwrap();

        let group = Group {
            name: "A".to_string(),
            task: "GoToPosition".to_string(),
            robot: "FloatingPlatform".to_string(),
            runs: vec![first, second],
        };
        let data = load_group(&group).unwrap();
        assert_eq!(data.metrics.len(), 2);
        assert_eq!(data.labels, vec!["A (seed_1)", "A (seed_2)"]);
        assert_eq!(data.env_info["robot"].as_str(), Some("FloatingPlatform"));
        assert_eq!(data.env_info["num_envs"].as_u64(), Some(64));
    }

    #[test]
    fn test_missing_env_info_is_empty_mapping() {
        let info = load_env_info("/nonexistent/env_info.yaml");
        assert!(info.as_mapping().map(|m| m.is_empty()).unwrap_or(false));
    }

    #[test]
    fn test_load_all_stops_on_metrics_failure() {
        let dir = TempDir::new().unwrap();
        let good = write_run(dir.path(), "good", Some("step\n0\n"), None);
        let bad = write_run(dir.path(), "bad", None, None);
        let groups = vec![
            Group { name: "A".into(), task: "T".into(), robot: String::new(), runs: vec![good] },
            Group { name: "B".into(), task: "T".into(), robot: String::new(), runs: vec![bad] },
        ];
        assert!(load_all(&groups).is_err());
    }
}
