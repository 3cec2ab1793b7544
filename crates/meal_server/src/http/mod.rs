//! REST surface over the task store.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /` | [`banner`] |
//! | `GET /health` | [`health`] |
//! | `GET /api/tasks` | [`list_tasks`] |
//! | `POST /api/tasks` | [`create_task`] |
//! | `GET /api/tasks/{id}` | [`get_task`] |
//! | `PUT /api/tasks/{id}` | [`update_task`] |
//! | `GET /api/stats` | [`stats`] |

mod error;

pub use error::ApiError;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use meal_core::error::AppError;
use meal_core::model::{StatisticsSnapshot, Task};
use meal_core::patch::{NewTask, TaskPatch};
use meal_core::store::{TaskFilter, TaskStore};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TaskStore>,
    pub environment: String,
    pub hostname: String,
}

impl AppState {
    pub fn new(store: Arc<TaskStore>, environment: impl Into<String>) -> Self {
        Self {
            store,
            environment: environment.into(),
            hostname: local_hostname(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub category: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", get(get_task).put(update_task))
        .route("/api/stats", get(stats))
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve(addr: &str, state: AppState) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::io(format!("failed to bind {addr}: {err}")))?;
    let local_addr: SocketAddr = listener.local_addr()?;

    info!(
        addr = %local_addr,
        environment = %state.environment,
        "meal planner listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("meal planner stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl-C; shutdown signal disabled");
        std::future::pending::<()>().await;
    }
}

pub async fn banner(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "Meal planner task service",
        "hostname": state.hostname,
        "environment": state.environment,
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let filter = TaskFilter::parse(params.status.as_deref(), params.category.as_deref())?;
    Ok(Json(state.store.list_tasks(&filter)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_task_id(&id)?;
    Ok(Json(state.store.get_task(id)?))
}

pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(body) = payload?;
    let new_task = NewTask::from_json(&body)?;
    let task = state.store.create_task(new_task)?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_task_id(&id)?;
    // An unknown id is reported before the body is looked at.
    state.store.get_task(id)?;
    let Json(body) = payload?;
    let patch = TaskPatch::from_json(&body)?;
    Ok(Json(state.store.update_task(id, &patch)?))
}

pub async fn stats(State(state): State<AppState>) -> Json<StatisticsSnapshot> {
    Json(state.store.compute_statistics())
}

/// Ids are unsigned integers; anything else cannot name a task.
fn parse_task_id(raw: &str) -> Result<u64, AppError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| AppError::not_found(format!("task {raw} not found")))
}

fn local_hostname() -> String {
    let name = gethostname::gethostname().to_string_lossy().trim().to_string();
    if name.is_empty() {
        "localhost".to_string()
    } else {
        name
    }
}
