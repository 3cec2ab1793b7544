use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Categories every meal plan is expected to use. Other values are accepted
/// and reported alongside these in statistics.
pub const KNOWN_CATEGORIES: [&str; 6] =
    ["appetizer", "main", "side", "dessert", "beverage", "prep"];

pub const DEFAULT_CATEGORY: &str = "main";
pub const DEFAULT_PRIORITY: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub status: TaskStatus,
    pub priority: i64,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    pub created_at: String,
}

/// Lifecycle of a task. Every status may move to every other status,
/// including `Completed` back to `Planned`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [Self::Planned, Self::InProgress, Self::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn can_transition_to(self, _next: TaskStatus) -> bool {
        true
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| {
                format!("status must be one of planned, in_progress, completed (got '{value}')")
            })
    }
}
