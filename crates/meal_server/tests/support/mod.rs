#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("meal-planner-{nanos}-{file_name}"))
}

/// Three tasks: id 1 planned (priority 2), id 2 completed (priority 1),
/// id 3 in progress (priority 3).
pub fn scenario_tasks() -> serde_json::Value {
    serde_json::json!([
        {
            "id": 1,
            "name": "Mashed potatoes",
            "category": "side",
            "status": "planned",
            "priority": 2,
            "created_at": "2025-11-27T00:00:00Z"
        },
        {
            "id": 2,
            "name": "Pumpkin pie",
            "category": "dessert",
            "status": "completed",
            "priority": 1,
            "created_at": "2025-11-27T00:00:00Z"
        },
        {
            "id": 3,
            "name": "Roast the turkey",
            "category": "main",
            "status": "in_progress",
            "priority": 3,
            "start_time": "10:00 AM",
            "duration": 240,
            "created_at": "2025-11-27T00:00:00Z"
        }
    ])
}

pub fn write_store(path: &Path, tasks: serde_json::Value) {
    let content = serde_json::json!({
        "schema_version": 1,
        "tasks": tasks
    });
    std::fs::write(path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
}

pub fn read_store(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

pub fn run(store_path: &Path, args: &[&str]) -> Output {
    let exe = env!("CARGO_BIN_EXE_meal_planner");
    Command::new(exe)
        .args(args)
        .env("MEAL_PLANNER_STORE_PATH", store_path)
        .env("MEAL_PLANNER_CONFIG_PATH", store_path.with_extension("config.json"))
        .env_remove("PORT")
        .env_remove("HOST")
        .env_remove("ENVIRONMENT")
        .env_remove("MEAL_PLANNER_SEED")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run meal_planner")
}
