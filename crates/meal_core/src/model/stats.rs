use super::task::{KNOWN_CATEGORIES, Task, TaskStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate view over the task collection. Never stored; rebuilt from the
/// tasks on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub total: usize,
    pub planned: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub completion_percentage: f64,
    pub by_category: BTreeMap<String, usize>,
}

impl StatisticsSnapshot {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut by_category: BTreeMap<String, usize> = KNOWN_CATEGORIES
            .iter()
            .map(|category| (category.to_string(), 0))
            .collect();
        let mut planned = 0;
        let mut in_progress = 0;
        let mut completed = 0;

        for task in tasks {
            match task.status {
                TaskStatus::Planned => planned += 1,
                TaskStatus::InProgress => in_progress += 1,
                TaskStatus::Completed => completed += 1,
            }
            *by_category.entry(task.category.clone()).or_insert(0) += 1;
        }

        Self {
            total: tasks.len(),
            planned,
            in_progress,
            completed,
            completion_percentage: completion_percentage(completed, tasks.len()),
            by_category,
        }
    }

    pub fn count_for(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::Planned => self.planned,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Completed => self.completed,
        }
    }
}

/// Percentage rounded to one decimal place; an empty collection is 0.0.
pub fn completion_percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = 100.0 * completed as f64 / total as f64;
    (raw * 10.0).round() / 10.0
}
