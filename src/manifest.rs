//! Machine-readable record of what was plotted.

use crate::dispatch::DispatchReport;
use crate::grouper::TaskBucket;
use crate::loader::EnvInfo;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    pub experiment: PathBuf,
    pub tasks: Vec<TaskEntry>,
    pub figures: Vec<PathBuf>,
    pub failures: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEntry {
    pub task: String,
    /// Robot used for robot plots; absent when they were skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub robot: Option<String>,
    pub groups: Vec<GroupEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupEntry {
    pub name: String,
    pub runs: Vec<String>,
    pub env_info: EnvInfo,
}

impl Manifest {
    pub fn new(experiment: &Path, buckets: &[TaskBucket], report: &DispatchReport) -> Self {
        let tasks = buckets
            .iter()
            .map(|bucket| TaskEntry {
                task: bucket.task.clone(),
                robot: bucket.robot.clone(),
                groups: bucket
                    .groups
                    .iter()
                    .map(|g| GroupEntry {
                        name: g.name.clone(),
                        runs: g.labels.clone(),
                        env_info: g.env_info.clone(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            experiment: experiment.to_path_buf(),
            tasks,
            figures: report.figures.clone(),
            failures: report.failures,
        }
    }

    /// Write as pretty JSON into `output_dir`, returning the file path
    pub fn write<P: AsRef<Path>>(&self, output_dir: P) -> Result<PathBuf> {
        let path = output_dir.as_ref().join(MANIFEST_FILE);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create manifest: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(path)
    }
}
