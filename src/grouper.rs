//! Re-keys loaded groups by task so groups of one task share a figure.

use crate::loader::{EnvInfo, GroupData};
use crate::table::Table;
use tracing::warn;

/// All groups declaring the same task, in declaration order
#[derive(Debug, Clone)]
pub struct TaskBucket {
    pub task: String,
    /// Robot for robot-specific plots, if one could be resolved
    pub robot: Option<String>,
    pub groups: Vec<GroupData>,
}

impl TaskBucket {
    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name.as_str()).collect()
    }

    /// Metrics tables keyed by group name
    pub fn dfs(&self) -> Vec<(&str, &[Table])> {
        self.groups
            .iter()
            .map(|g| (g.name.as_str(), g.metrics.as_slice()))
            .collect()
    }

    /// Trajectory tables keyed by group name
    pub fn trajectories_dfs(&self) -> Vec<(&str, &[Table])> {
        self.groups
            .iter()
            .map(|g| (g.name.as_str(), g.trajectories.as_slice()))
            .collect()
    }

    /// Run labels keyed by group name
    pub fn labels(&self) -> Vec<(&str, &[String])> {
        self.groups
            .iter()
            .map(|g| (g.name.as_str(), g.labels.as_slice()))
            .collect()
    }

    /// env_info keyed by group name
    pub fn env_info(&self) -> Vec<(&str, &EnvInfo)> {
        self.groups
            .iter()
            .map(|g| (g.name.as_str(), &g.env_info))
            .collect()
    }
}

/// Bucket groups by task, ordered by each task's first appearance.
///
/// `is_known_robot` decides whether a bucket's robot can be plotted.
pub fn bucket_by_task<F>(groups: Vec<GroupData>, is_known_robot: F) -> Vec<TaskBucket>
where
    F: Fn(&str) -> bool,
{
    let mut buckets: Vec<TaskBucket> = Vec::new();

    for group in groups {
        match buckets.iter_mut().find(|b| b.task == group.task) {
            Some(bucket) => bucket.groups.push(group),
            None => buckets.push(TaskBucket {
                task: group.task.clone(),
                robot: None,
                groups: vec![group],
            }),
        }
    }

    for bucket in &mut buckets {
        bucket.robot = resolve_robot(bucket, &is_known_robot);
    }

    buckets
}

fn resolve_robot<F>(bucket: &TaskBucket, is_known_robot: &F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let first = bucket.groups.first()?;
    let robot = first.robot.as_str();

    if let Some(other) = bucket.groups.iter().find(|g| g.robot != robot) {
        warn!(
            task = %bucket.task,
            "Groups declare different robots ('{}' and '{}'), using '{}'",
            robot, other.robot, robot
        );
    }

    if robot.is_empty() {
        warn!(task = %bucket.task, "No robot name for task, skipping robot plots");
        return None;
    }
    if !is_known_robot(robot) {
        warn!(task = %bucket.task, robot, "Unknown robot, skipping robot plots");
        return None;
    }
    Some(robot.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn group(name: &str, task: &str, robot: &str) -> GroupData {
        GroupData {
            name: name.to_string(),
            task: task.to_string(),
            robot: robot.to_string(),
            metrics: vec![Table::empty()],
            trajectories: vec![Table::empty()],
            labels: vec![format!("{} (seed_1)", name)],
            env_info: EnvInfo::Null,
        }
    }

    fn known(robot: &str) -> bool {
        robot == "FloatingPlatform"
    }

    #[test]
    fn test_bucket_keys_match_declared_tasks() {
        let groups = vec![
            group("A", "GoToPosition", "FloatingPlatform"),
            group("B", "GoToPose", "FloatingPlatform"),
            group("C", "GoToPosition", "FloatingPlatform"),
            group("D", "Rendezvous", "FloatingPlatform"),
        ];
        let declared: BTreeSet<String> = groups.iter().map(|g| g.task.clone()).collect();

        let buckets = bucket_by_task(groups, known);
        let keys: BTreeSet<String> = buckets.iter().map(|b| b.task.clone()).collect();
        assert_eq!(keys, declared);
        assert_eq!(
            buckets.iter().map(|b| b.task.as_str()).collect::<Vec<_>>(),
            vec!["GoToPosition", "GoToPose", "Rendezvous"]
        );
    }

    #[test]
    fn test_bucket_contains_exactly_matching_groups() {
        let groups = vec![
            group("A", "GoToPosition", "FloatingPlatform"),
            group("B", "GoToPose", "FloatingPlatform"),
            group("C", "GoToPosition", "FloatingPlatform"),
        ];
        let buckets = bucket_by_task(groups, known);

        assert_eq!(buckets[0].group_names(), vec!["A", "C"]);
        assert_eq!(buckets[1].group_names(), vec!["B"]);
        for bucket in &buckets {
            assert!(bucket.groups.iter().all(|g| g.task == bucket.task));
        }
    }

    #[test]
    fn test_robot_resolution() {
        let groups = vec![
            group("A", "GoToPosition", "FloatingPlatform"),
            group("B", "GoToPose", "Submarine"),
            group("C", "Rendezvous", ""),
        ];
        let buckets = bucket_by_task(groups, known);

        assert_eq!(buckets[0].robot.as_deref(), Some("FloatingPlatform"));
        assert_eq!(buckets[1].robot, None);
        assert_eq!(buckets[2].robot, None);
    }

    #[test]
    fn test_first_group_robot_wins_on_conflict() {
        let groups = vec![
            group("A", "GoToPosition", "FloatingPlatform"),
            group("B", "GoToPosition", "Submarine"),
        ];
        let buckets = bucket_by_task(groups, known);
        assert_eq!(buckets[0].robot.as_deref(), Some("FloatingPlatform"));
    }

    #[test]
    fn test_keyed_views_follow_group_order() {
        let buckets = bucket_by_task(
            vec![group("A", "T", ""), group("B", "T", "")],
            known,
        );
        let bucket = &buckets[0];
        let names: Vec<&str> = bucket.dfs().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(bucket.labels()[1].1, &["B (seed_1)".to_string()]);
        assert_eq!(bucket.trajectories_dfs().len(), 2);
        assert_eq!(bucket.env_info().len(), 2);
    }
}
