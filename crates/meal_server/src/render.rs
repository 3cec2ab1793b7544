use meal_core::error::AppError;
use meal_core::model::{StatisticsSnapshot, Task};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Priority")]
    priority: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Start")]
    start_time: String,
    #[tabled(rename = "Minutes")]
    duration: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            priority: task.priority,
            name: task.name.clone(),
            category: task.category.clone(),
            status: task.status.to_string(),
            start_time: task.start_time.clone().unwrap_or_else(|| "-".to_string()),
            duration: task
                .duration
                .map(|minutes| minutes.to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Tasks")]
    count: usize,
}

pub fn tasks_table(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks.".to_string();
    }
    let mut table = Table::new(tasks.iter().map(TaskRow::from));
    table.with(Style::psql());
    table.to_string()
}

pub fn task_details(task: &Task) -> String {
    let or_dash = |value: Option<&str>| value.unwrap_or("-").to_string();
    let ingredients = if task.ingredients.is_empty() {
        "-".to_string()
    } else {
        task.ingredients.join(", ")
    };

    [
        format!("ID:          {}", task.id),
        format!("Name:        {}", task.name),
        format!("Category:    {}", task.category),
        format!("Status:      {}", task.status),
        format!("Priority:    {}", task.priority),
        format!("Start:       {}", or_dash(task.start_time.as_deref())),
        format!(
            "Minutes:     {}",
            task.duration
                .map(|minutes| minutes.to_string())
                .unwrap_or_else(|| "-".to_string())
        ),
        format!("Assigned to: {}", or_dash(task.assigned_to.as_deref())),
        format!("Ingredients: {ingredients}"),
        format!("Notes:       {}", or_dash(task.notes.as_deref())),
        format!("Created:     {}", task.created_at),
    ]
    .join("\n")
}

pub fn statistics_summary(stats: &StatisticsSnapshot) -> String {
    let mut lines = vec![
        format!("Total:       {}", stats.total),
        format!("Planned:     {}", stats.planned),
        format!("In progress: {}", stats.in_progress),
        format!("Completed:   {}", stats.completed),
        format!("Completion:  {:.1}%", stats.completion_percentage),
    ];

    let rows: Vec<CategoryRow> = stats
        .by_category
        .iter()
        .map(|(category, count)| CategoryRow {
            category: category.clone(),
            count: *count,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::psql());
    lines.push(String::new());
    lines.push(table.to_string());

    lines.join("\n")
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|err| AppError::invalid_data(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{statistics_summary, task_details, tasks_table};
    use meal_core::model::{StatisticsSnapshot, Task, TaskStatus};

    fn task() -> Task {
        Task {
            id: 3,
            name: "Cranberry sauce".to_string(),
            category: "side".to_string(),
            status: TaskStatus::InProgress,
            priority: 4,
            start_time: Some("11:00 AM".to_string()),
            duration: None,
            notes: None,
            assigned_to: Some("Robin".to_string()),
            ingredients: vec!["cranberries".to_string(), "sugar".to_string()],
            created_at: "2025-11-27T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn tasks_table_lists_each_task() {
        let rendered = tasks_table(&[task()]);
        assert!(rendered.contains("Cranberry sauce"));
        assert!(rendered.contains("in_progress"));
        assert!(rendered.contains("11:00 AM"));
    }

    #[test]
    fn tasks_table_reports_empty_list() {
        assert_eq!(tasks_table(&[]), "No tasks.");
    }

    #[test]
    fn task_details_fills_missing_values_with_dash() {
        let rendered = task_details(&task());
        assert!(rendered.contains("Minutes:     -"));
        assert!(rendered.contains("Ingredients: cranberries, sugar"));
        assert!(rendered.contains("Assigned to: Robin"));
    }

    #[test]
    fn statistics_summary_shows_percentage() {
        let stats = StatisticsSnapshot::from_tasks(&[task()]);
        let rendered = statistics_summary(&stats);
        assert!(rendered.contains("Completion:  0.0%"));
        assert!(rendered.contains("side"));
    }
}
