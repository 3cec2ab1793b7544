//! Validated partial updates.
//!
//! A request body arrives as arbitrary JSON. [`TaskPatch::from_json`] checks
//! every recognized field up front and produces a typed patch, so applying it
//! can no longer fail and a bad field never leaves a task half-updated.
//! Unrecognized fields are ignored, as are the read-only `id` and
//! `created_at`.

use crate::error::AppError;
use crate::model::{DEFAULT_CATEGORY, DEFAULT_PRIORITY, Task, TaskStatus};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<i64>,
    /// `Some(None)` clears the field.
    pub start_time: Option<Option<String>>,
    pub duration: Option<Option<u32>>,
    pub notes: Option<Option<String>>,
    pub assigned_to: Option<Option<String>>,
    pub ingredients: Option<Vec<String>>,
}

impl TaskPatch {
    pub fn from_json(value: &Value) -> Result<Self, AppError> {
        let fields = value
            .as_object()
            .ok_or_else(|| AppError::validation("request body must be a JSON object"))?;

        Ok(Self {
            name: lookup(fields, &["name"])
                .map(|value| required_text("name", value))
                .transpose()?,
            category: lookup(fields, &["category"])
                .map(|value| required_text("category", value))
                .transpose()?,
            status: lookup(fields, &["status"]).map(status).transpose()?,
            priority: lookup(fields, &["priority"])
                .map(|value| integer("priority", value))
                .transpose()?,
            start_time: lookup(fields, &["start_time"])
                .map(|value| optional_text("start_time", value))
                .transpose()?,
            duration: lookup(fields, &["duration", "duration_minutes"])
                .map(|value| optional_minutes("duration", value))
                .transpose()?,
            notes: lookup(fields, &["notes", "description"])
                .map(|value| optional_text("notes", value))
                .transpose()?,
            assigned_to: lookup(fields, &["assigned_to"])
                .map(|value| optional_text("assigned_to", value))
                .transpose()?,
            ingredients: lookup(fields, &["ingredients"])
                .map(ingredients)
                .transpose()?,
        })
    }

    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name = name.clone();
        }
        if let Some(category) = &self.category {
            task.category = category.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(start_time) = &self.start_time {
            task.start_time = start_time.clone();
        }
        if let Some(duration) = self.duration {
            task.duration = duration;
        }
        if let Some(notes) = &self.notes {
            task.notes = notes.clone();
        }
        if let Some(assigned_to) = &self.assigned_to {
            task.assigned_to = assigned_to.clone();
        }
        if let Some(ingredients) = &self.ingredients {
            task.ingredients = ingredients.clone();
        }
    }
}

/// Fields for a task that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub category: String,
    pub status: TaskStatus,
    pub priority: i64,
    pub start_time: Option<String>,
    pub duration: Option<u32>,
    pub notes: Option<String>,
    pub assigned_to: Option<String>,
    pub ingredients: Vec<String>,
}

impl NewTask {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            category: DEFAULT_CATEGORY.to_string(),
            status: TaskStatus::Planned,
            priority: DEFAULT_PRIORITY,
            start_time: None,
            duration: None,
            notes: None,
            assigned_to: None,
            ingredients: Vec::new(),
        }
    }

    pub fn with_category<C: Into<String>>(mut self, category: C) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn from_json(value: &Value) -> Result<Self, AppError> {
        let patch = TaskPatch::from_json(value)?;
        let name = patch
            .name
            .ok_or_else(|| AppError::validation("name is required"))?;
        let mut new_task = Self::new(name);
        if let Some(category) = patch.category {
            new_task.category = category;
        }
        if let Some(status) = patch.status {
            new_task.status = status;
        }
        if let Some(priority) = patch.priority {
            new_task.priority = priority;
        }
        new_task.start_time = patch.start_time.flatten();
        new_task.duration = patch.duration.flatten();
        new_task.notes = patch.notes.flatten();
        new_task.assigned_to = patch.assigned_to.flatten();
        new_task.ingredients = patch.ingredients.unwrap_or_default();
        Ok(new_task)
    }

    /// Checks the fields a builder could have left invalid.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("name must be a non-empty string"));
        }
        if self.category.trim().is_empty() {
            return Err(AppError::validation("category must be a non-empty string"));
        }
        Ok(())
    }

    pub fn into_task(self, id: u64, created_at: String) -> Task {
        Task {
            id,
            name: self.name.trim().to_string(),
            category: self.category.trim().to_string(),
            status: self.status,
            priority: self.priority,
            start_time: self.start_time,
            duration: self.duration,
            notes: self.notes,
            assigned_to: self.assigned_to,
            ingredients: self.ingredients,
            created_at,
        }
    }
}

fn lookup<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| fields.get(*name))
}

fn required_text(field: &str, value: &Value) -> Result<String, AppError> {
    match value.as_str().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(AppError::validation(format!(
            "{field} must be a non-empty string"
        ))),
    }
}

fn optional_text(field: &str, value: &Value) -> Result<Option<String>, AppError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => {
            let trimmed = text.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        _ => Err(AppError::validation(format!(
            "{field} must be a string or null"
        ))),
    }
}

fn status(value: &Value) -> Result<TaskStatus, AppError> {
    let raw = value
        .as_str()
        .ok_or_else(|| AppError::validation("status must be a string"))?;
    raw.parse().map_err(AppError::validation)
}

fn integer(field: &str, value: &Value) -> Result<i64, AppError> {
    value
        .as_i64()
        .ok_or_else(|| AppError::validation(format!("{field} must be an integer")))
}

fn optional_minutes(field: &str, value: &Value) -> Result<Option<u32>, AppError> {
    if value.is_null() {
        return Ok(None);
    }
    value
        .as_u64()
        .and_then(|minutes| u32::try_from(minutes).ok())
        .map(Some)
        .ok_or_else(|| {
            AppError::validation(format!(
                "{field} must be a non-negative integer number of minutes"
            ))
        })
}

fn ingredients(value: &Value) -> Result<Vec<String>, AppError> {
    let items = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        _ => {
            return Err(AppError::validation(
                "ingredients must be an array of strings",
            ));
        }
    };

    let mut parsed = Vec::with_capacity(items.len());
    for item in items {
        let text = item
            .as_str()
            .ok_or_else(|| AppError::validation("ingredients must be an array of strings"))?;
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parsed.push(trimmed.to_string());
        }
    }
    Ok(parsed)
}
