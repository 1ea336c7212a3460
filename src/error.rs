//! Error types for experiment loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or validating an experiment file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read experiment file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse experiment file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("No enabled groups in experiment file")]
    NoGroups,

    #[error("Group '{0}' is declared more than once")]
    DuplicateGroup(String),

    #[error("Group '{0}' has no runs")]
    EmptyGroup(String),

    #[error("Group '{group}' has an incomplete run: {reason}")]
    InvalidRun { group: String, reason: String },

    #[error("Invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),
}

/// Errors raised while loading a run's files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read metrics file {path}: {source}")]
    Metrics {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Metrics file {0} has no header row")]
    MissingHeader(PathBuf),

    #[error("Failed to read trajectories file {path}: {source}")]
    Trajectories {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl LoadError {
    /// Path of the file that failed to load
    pub fn path(&self) -> &PathBuf {
        match self {
            LoadError::Metrics { path, .. } => path,
            LoadError::MissingHeader(path) => path,
            LoadError::Trajectories { path, .. } => path,
        }
    }
}
