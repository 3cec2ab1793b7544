mod stats;
mod task;

pub use stats::StatisticsSnapshot;
pub use task::{DEFAULT_CATEGORY, DEFAULT_PRIORITY, KNOWN_CATEGORIES, Task, TaskStatus};
