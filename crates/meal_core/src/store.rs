use crate::error::AppError;
use crate::model::{StatisticsSnapshot, Task, TaskStatus};
use crate::patch::{NewTask, TaskPatch};
use crate::seed;
use crate::storage::json_store::{self, TaskState};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub category: Option<String>,
}

impl TaskFilter {
    /// Builds a filter from raw query values. Blank values mean "any".
    pub fn parse(status: Option<&str>, category: Option<&str>) -> Result<Self, AppError> {
        let status = status
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| value.parse::<TaskStatus>().map_err(AppError::validation))
            .transpose()?;
        let category = category
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Ok(Self { status, category })
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|status| task.status == status)
            && self
                .category
                .as_deref()
                .is_none_or(|category| task.category == category)
    }
}

/// Owns the task collection. Every operation holds the lock for its whole
/// duration, so a reader never sees a partially applied update.
#[derive(Debug)]
pub struct TaskStore {
    state: Mutex<TaskState>,
    path: Option<PathBuf>,
}

impl TaskStore {
    pub fn new(state: TaskState, path: Option<PathBuf>) -> Self {
        Self {
            state: Mutex::new(state),
            path,
        }
    }

    pub fn in_memory(tasks: Vec<Task>) -> Result<Self, AppError> {
        Ok(Self::new(TaskState::from_tasks(tasks)?, None))
    }

    /// Opens the store file, seeding the default meal plan when the file does
    /// not exist yet and `seed` is set.
    pub fn open(path: &Path, seed: bool) -> Result<Self, AppError> {
        let state = match json_store::load_state(path)? {
            Some(state) => {
                info!(path = %path.display(), tasks = state.tasks.len(), "loaded task store");
                state
            }
            None if seed => {
                let state = TaskState::from_tasks(seed::default_tasks(&now_rfc3339()?))?;
                json_store::save_state(path, &state)?;
                info!(path = %path.display(), tasks = state.tasks.len(), "seeded new task store");
                state
            }
            None => {
                info!(path = %path.display(), "starting with an empty task store");
                TaskState::from_tasks(Vec::new())?
            }
        };
        Ok(Self::new(state, Some(path.to_path_buf())))
    }

    /// Matching tasks by ascending priority, ties by ascending id.
    pub fn list_tasks(&self, filter: &TaskFilter) -> Vec<Task> {
        let state = self.lock();
        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();
        tasks.sort_by_key(|task| (task.priority, task.id));
        debug!(count = tasks.len(), "listed tasks");
        tasks
    }

    pub fn get_task(&self, id: u64) -> Result<Task, AppError> {
        let state = self.lock();
        state
            .tasks
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or_else(|| AppError::task_not_found(id))
    }

    /// Applies `patch` to a copy of the collection, persists the copy, and
    /// only then makes it visible.
    pub fn update_task(&self, id: u64, patch: &TaskPatch) -> Result<Task, AppError> {
        let mut state = self.lock();
        let index = state
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| AppError::task_not_found(id))?;

        if patch.is_empty() {
            debug!(task_id = id, "empty patch; nothing to store");
            return Ok(state.tasks[index].clone());
        }

        let previous_status = state.tasks[index].status;
        if let Some(next) = patch.status
            && !previous_status.can_transition_to(next)
        {
            return Err(AppError::validation(format!(
                "cannot move task {id} from {previous_status} to {next}"
            )));
        }

        let mut next_state = state.clone();
        patch.apply(&mut next_state.tasks[index]);
        let updated = next_state.tasks[index].clone();
        self.commit(&mut state, next_state)?;

        info!(
            task_id = id,
            from = %previous_status,
            to = %updated.status,
            "task updated"
        );
        Ok(updated)
    }

    pub fn create_task(&self, new_task: NewTask) -> Result<Task, AppError> {
        new_task.validate()?;
        let created_at = now_rfc3339()?;

        let mut state = self.lock();
        let mut next_state = state.clone();
        let id = next_state.allocate_id()?;
        let task = new_task.into_task(id, created_at);
        next_state.tasks.push(task.clone());
        self.commit(&mut state, next_state)?;

        info!(task_id = task.id, category = %task.category, "task created");
        Ok(task)
    }

    pub fn compute_statistics(&self) -> StatisticsSnapshot {
        let state = self.lock();
        StatisticsSnapshot::from_tasks(&state.tasks)
    }

    fn commit(&self, current: &mut TaskState, next: TaskState) -> Result<(), AppError> {
        if let Some(path) = self.path.as_deref() {
            json_store::save_state(path, &next).inspect_err(|err| {
                error!(path = %path.display(), error = %err, "failed to persist task store");
            })?;
        }
        *current = next;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, TaskState> {
        // Operations replace the state wholesale, so a poisoned guard still
        // holds a consistent collection.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn now_rfc3339() -> Result<String, AppError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{TaskFilter, TaskStore};
    use crate::model::{Task, TaskStatus};
    use crate::patch::{NewTask, TaskPatch};
    use crate::storage::json_store::{self, TaskState};
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("meal-planner-{nanos}-{file_name}"))
    }

    fn task(id: u64, priority: i64, status: TaskStatus) -> Task {
        Task {
            id,
            name: format!("task {id}"),
            category: "side".to_string(),
            status,
            priority,
            start_time: None,
            duration: None,
            notes: None,
            assigned_to: None,
            ingredients: Vec::new(),
            created_at: "2025-11-27T00:00:00Z".to_string(),
        }
    }

    fn scenario_store() -> TaskStore {
        TaskStore::in_memory(vec![
            task(1, 2, TaskStatus::Planned),
            task(2, 1, TaskStatus::Completed),
            task(3, 3, TaskStatus::InProgress),
        ])
        .unwrap()
    }

    fn ids(tasks: &[Task]) -> Vec<u64> {
        tasks.iter().map(|task| task.id).collect()
    }

    #[test]
    fn list_orders_by_priority() {
        let store = scenario_store();
        let listed = store.list_tasks(&TaskFilter::default());
        assert_eq!(ids(&listed), vec![2, 1, 3]);
    }

    #[test]
    fn list_breaks_priority_ties_by_id() {
        let store = TaskStore::in_memory(vec![
            task(5, 1, TaskStatus::Planned),
            task(3, 1, TaskStatus::Planned),
            task(4, 0, TaskStatus::Planned),
            task(1, 1, TaskStatus::Planned),
        ])
        .unwrap();

        let listed = store.list_tasks(&TaskFilter::default());
        assert_eq!(ids(&listed), vec![4, 1, 3, 5]);
        assert!(listed.windows(2).all(|pair| pair[0].priority <= pair[1].priority));
    }

    #[test]
    fn list_of_empty_store_is_empty() {
        let store = TaskStore::in_memory(Vec::new()).unwrap();
        assert!(store.list_tasks(&TaskFilter::default()).is_empty());
    }

    #[test]
    fn list_applies_status_and_category_filters() {
        let mut main = task(4, 0, TaskStatus::Planned);
        main.category = "main".to_string();
        let store = TaskStore::in_memory(vec![
            task(1, 2, TaskStatus::Planned),
            task(2, 1, TaskStatus::Completed),
            main,
        ])
        .unwrap();

        let planned = store.list_tasks(&TaskFilter::parse(Some("planned"), None).unwrap());
        assert_eq!(ids(&planned), vec![4, 1]);

        let planned_sides =
            store.list_tasks(&TaskFilter::parse(Some("planned"), Some("side")).unwrap());
        assert_eq!(ids(&planned_sides), vec![1]);
    }

    #[test]
    fn filter_rejects_unknown_status_and_ignores_blanks() {
        let err = TaskFilter::parse(Some("bogus"), None).unwrap_err();
        assert_eq!(err.code(), "validation_error");

        assert_eq!(
            TaskFilter::parse(Some(" "), Some("")).unwrap(),
            TaskFilter::default()
        );
    }

    #[test]
    fn get_missing_task_is_not_found() {
        let err = scenario_store().get_task(42).unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn scenario_statistics() {
        let stats = scenario_store().compute_statistics();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.completion_percentage, 33.3);
    }

    #[test]
    fn reverting_completed_task_to_planned() {
        let store = scenario_store();
        store
            .update_task(2, &TaskPatch::status(TaskStatus::Planned))
            .unwrap();

        assert_eq!(store.get_task(2).unwrap().status, TaskStatus::Planned);
        assert_eq!(store.compute_statistics().completed, 0);
    }

    #[test]
    fn every_status_transition_is_applied() {
        let store = scenario_store();
        for from in TaskStatus::ALL {
            for to in TaskStatus::ALL {
                store.update_task(1, &TaskPatch::status(from)).unwrap();
                store.update_task(1, &TaskPatch::status(to)).unwrap();
                assert_eq!(store.get_task(1).unwrap().status, to);
            }
        }
    }

    #[test]
    fn bogus_status_leaves_task_unchanged() {
        let store = scenario_store();
        let before = store.get_task(3).unwrap();

        let err = TaskPatch::from_json(&json!({ "status": "bogus" }))
            .and_then(|patch| store.update_task(3, &patch))
            .unwrap_err();

        assert_eq!(err.code(), "validation_error");
        assert_eq!(store.get_task(3).unwrap(), before);
    }

    #[test]
    fn invalid_priority_leaves_task_unchanged() {
        let store = scenario_store();
        let before = store.get_task(1).unwrap().priority;

        let err = TaskPatch::from_json(&json!({ "priority": "not-a-number", "name": "x" }))
            .and_then(|patch| store.update_task(1, &patch))
            .unwrap_err();

        assert_eq!(err.code(), "validation_error");
        assert_eq!(store.get_task(1).unwrap().priority, before);
        assert_eq!(store.get_task(1).unwrap().name, "task 1");
    }

    #[test]
    fn update_missing_task_is_not_found() {
        let err = scenario_store()
            .update_task(99, &TaskPatch::status(TaskStatus::Completed))
            .unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn create_assigns_next_id_and_defaults() {
        let store = scenario_store();
        let created = store
            .create_task(NewTask::new("Gravy").with_category("side"))
            .unwrap();

        assert_eq!(created.id, 4);
        assert_eq!(created.status, TaskStatus::Planned);
        assert_eq!(created.priority, 1);
        assert_eq!(store.compute_statistics().total, 4);
    }

    #[test]
    fn create_rejects_blank_name() {
        let store = scenario_store();
        let err = store.create_task(NewTask::new("  ")).unwrap_err();

        assert_eq!(err.code(), "validation_error");
        assert_eq!(store.compute_statistics().total, 3);
    }

    #[test]
    fn open_seeds_and_persists_a_new_store() {
        let path = temp_path("seeded.json");
        let store = TaskStore::open(&path, true).unwrap();
        let seeded = store.list_tasks(&TaskFilter::default()).len();
        let on_disk = json_store::load_tasks(&path).unwrap().len();
        std::fs::remove_file(&path).ok();

        assert!(seeded > 0);
        assert_eq!(seeded, on_disk);
    }

    #[test]
    fn open_without_seed_starts_empty() {
        let path = temp_path("unseeded.json");
        let store = TaskStore::open(&path, false).unwrap();

        assert_eq!(store.compute_statistics().total, 0);
        assert!(!path.exists());
    }

    #[test]
    fn updates_survive_reopening() {
        let path = temp_path("reopen.json");
        json_store::save_state(
            &path,
            &TaskState::from_tasks(vec![task(1, 1, TaskStatus::Planned)]).unwrap(),
        )
        .unwrap();

        let store = TaskStore::open(&path, true).unwrap();
        store
            .update_task(1, &TaskPatch::status(TaskStatus::Completed))
            .unwrap();
        let created = store.create_task(NewTask::new("Rolls")).unwrap();

        let reopened = TaskStore::open(&path, true).unwrap();
        let status = reopened.get_task(1).unwrap().status;
        let next = reopened.create_task(NewTask::new("Butter")).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(status, TaskStatus::Completed);
        assert_eq!(created.id, 2);
        assert_eq!(next.id, 3);
    }

    #[test]
    fn failed_save_leaves_memory_unchanged() {
        let blocker = temp_path("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = TaskStore::new(
            TaskState::from_tasks(vec![task(1, 1, TaskStatus::Planned)]).unwrap(),
            Some(blocker.join("tasks.json")),
        );

        let update = store.update_task(1, &TaskPatch::status(TaskStatus::Completed));
        let create = store.create_task(NewTask::new("Rolls"));
        std::fs::remove_file(&blocker).ok();

        assert_eq!(update.unwrap_err().code(), "io_error");
        assert_eq!(create.unwrap_err().code(), "io_error");
        assert_eq!(store.get_task(1).unwrap().status, TaskStatus::Planned);
        assert_eq!(store.compute_statistics().total, 1);
    }

    #[test]
    fn open_rejects_task_id_at_counter_limit() {
        let path = temp_path("max-id-store.json");
        let mut raw = serde_json::to_value(task(1, 1, TaskStatus::Planned)).unwrap();
        raw["id"] = json!(u64::MAX);
        let content = json!({ "schema_version": 1, "tasks": [raw] });
        std::fs::write(&path, content.to_string()).unwrap();

        let err = TaskStore::open(&path, true).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn create_fails_cleanly_once_ids_are_exhausted() {
        let path = temp_path("max-counter.json");
        let content = json!({ "schema_version": 1, "next_id": u64::MAX, "tasks": [] });
        std::fs::write(&path, content.to_string()).unwrap();

        let store = TaskStore::open(&path, true).unwrap();
        let first = store.create_task(NewTask::new("Rolls"));
        let second = store.create_task(NewTask::new("Butter"));
        let on_disk = json_store::load_state(&path).unwrap().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(first.unwrap_err().code(), "invalid_data");
        assert_eq!(second.unwrap_err().code(), "invalid_data");
        assert_eq!(store.compute_statistics().total, 0);
        assert!(on_disk.tasks.is_empty());
        assert_eq!(on_disk.next_id, u64::MAX);
    }

    #[test]
    fn empty_patch_returns_task_without_writing() {
        let blocker = temp_path("empty-patch-blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = TaskStore::new(
            TaskState::from_tasks(vec![task(1, 1, TaskStatus::Planned)]).unwrap(),
            Some(blocker.join("tasks.json")),
        );

        let result = store.update_task(1, &TaskPatch::default());
        std::fs::remove_file(&blocker).ok();

        assert_eq!(result.unwrap(), task(1, 1, TaskStatus::Planned));
    }
}
