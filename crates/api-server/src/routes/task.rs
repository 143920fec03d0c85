//! Task API endpoints
//!
//! CRUD for the signed-in user's tasks plus the subtask and status toggles
//! used by the list view.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use taskdeck_core::dashboard::is_overdue;
use taskdeck_core::task::{sort_for_list, NewTask, Task, TaskPatch};
use taskdeck_core::Error;

use super::{api_error, session_user, RouteError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// A task as the list view renders it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    #[serde(flatten)]
    pub task: Task,
    pub progress: u8,
    pub overdue: bool,
}

impl TaskResponse {
    fn new(task: Task, now: NaiveDateTime) -> Self {
        Self {
            progress: task.progress(),
            overdue: is_overdue(&task, now),
            task,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirmed: bool,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Load a task and check it belongs to `user_id`. Foreign tasks look missing.
pub(crate) async fn owned_task(state: &AppState, user_id: &str, id: &str) -> Result<Task, RouteError> {
    match state.repository().get_task(id).await.map_err(api_error)? {
        Some(task) if task.user_id == user_id => Ok(task),
        _ => Err(api_error(Error::TaskNotFound(id.to_string()))),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/tasks - List the user's tasks in display order
async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<TaskResponse>>, RouteError> {
    let user_id = session_user(&headers)?;
    let mut tasks = state
        .repository()
        .list_tasks_for_user(&user_id)
        .await
        .map_err(api_error)?;
    sort_for_list(&mut tasks);

    let now = now();
    Ok(Json(
        tasks
            .into_iter()
            .map(|task| TaskResponse::new(task, now))
            .collect(),
    ))
}

/// POST /api/tasks - Create a new task
async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewTask>,
) -> Result<(StatusCode, Json<TaskResponse>), RouteError> {
    let user_id = session_user(&headers)?;
    let task = state
        .repository()
        .create_task(&user_id, req)
        .await
        .map_err(api_error)?;

    Ok((StatusCode::CREATED, Json(TaskResponse::new(task, now()))))
}

/// GET /api/tasks/{id} - Get a task by ID
async fn get_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, RouteError> {
    let user_id = session_user(&headers)?;
    let task = owned_task(&state, &user_id, &id).await?;
    Ok(Json(TaskResponse::new(task, now())))
}

/// PATCH /api/tasks/{id} - Partial update
async fn update_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<TaskResponse>, RouteError> {
    let user_id = session_user(&headers)?;
    owned_task(&state, &user_id, &id).await?;

    let task = state
        .repository()
        .update_task(&id, patch)
        .await
        .map_err(api_error)?;
    Ok(Json(TaskResponse::new(task, now())))
}

/// DELETE /api/tasks/{id} - Delete a task; already-deleted ids succeed
async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, RouteError> {
    let user_id = session_user(&headers)?;
    let existing = state.repository().get_task(&id).await.map_err(api_error)?;
    if existing.is_some_and(|task| task.user_id != user_id) {
        return Err(api_error(Error::TaskNotFound(id)));
    }

    state.repository().delete_task(&id).await.map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/tasks/{id}/subtasks/{subtask_id}/toggle
async fn toggle_subtask(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, subtask_id)): Path<(String, String)>,
) -> Result<Json<TaskResponse>, RouteError> {
    let user_id = session_user(&headers)?;
    owned_task(&state, &user_id, &id).await?;

    let task = state
        .repository()
        .toggle_subtask(&id, &subtask_id)
        .await
        .map_err(api_error)?;
    Ok(Json(TaskResponse::new(task, now())))
}

/// POST /api/tasks/{id}/status/toggle?confirmed=true
async fn toggle_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<TaskResponse>, RouteError> {
    let user_id = session_user(&headers)?;
    owned_task(&state, &user_id, &id).await?;

    let task = state
        .repository()
        .toggle_task_status(&id, query.confirmed)
        .await
        .map_err(api_error)?;
    Ok(Json(TaskResponse::new(task, now())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route(
            "/api/tasks/{id}/subtasks/{subtask_id}/toggle",
            post(toggle_subtask),
        )
        .route("/api/tasks/{id}/status/toggle", post(toggle_status))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{build_state, send};

    #[tokio::test]
    async fn missing_session_is_unauthorized() {
        let app = super::router().with_state(build_state().await);
        let (status, _) = send(&app, "GET", "/api/tasks", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_list_and_delete() {
        let app = super::router().with_state(build_state().await);

        let (status, created) = send(
            &app,
            "POST",
            "/api/tasks",
            Some("u1"),
            Some(json!({
                "title": "Write report",
                "priority": "high",
                "dueDate": "2030-01-10",
                "subtasks": [{ "title": " outline " }, { "title": "   " }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "todo");
        assert_eq!(created["subtasks"].as_array().unwrap().len(), 1);
        assert_eq!(created["subtasks"][0]["title"], "outline");
        assert_eq!(created["overdue"], false);

        let (status, listed) = send(&app, "GET", "/api/tasks", Some("u1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (_, others) = send(&app, "GET", "/api/tasks", Some("u2"), None).await;
        assert_eq!(others, json!([]));

        let uri = format!("/api/tasks/{}", created["id"].as_str().unwrap());
        let (status, _) = send(&app, "DELETE", &uri, Some("u1"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "DELETE", &uri, Some("u1"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let app = super::router().with_state(build_state().await);
        let (status, body) = send(
            &app,
            "POST",
            "/api/tasks",
            Some("u1"),
            Some(json!({ "title": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["field"], "title");
    }

    #[tokio::test]
    async fn foreign_task_is_not_found() {
        let app = super::router().with_state(build_state().await);
        let (_, created) = send(
            &app,
            "POST",
            "/api/tasks",
            Some("u1"),
            Some(json!({ "title": "private" })),
        )
        .await;

        let uri = format!("/api/tasks/{}", created["id"].as_str().unwrap());
        let (status, _) = send(&app, "GET", &uri, Some("u2"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "DELETE", &uri, Some("u2"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn subtasks_drive_status() {
        let app = super::router().with_state(build_state().await);
        let (_, created) = send(
            &app,
            "POST",
            "/api/tasks",
            Some("u1"),
            Some(json!({ "title": "trip", "subtasks": [{ "title": "pack" }] })),
        )
        .await;
        let id = created["id"].as_str().unwrap();
        let subtask_id = created["subtasks"][0]["id"].as_str().unwrap();

        let toggle_status = format!("/api/tasks/{}/status/toggle", id);
        let (status, _) = send(&app, "POST", &toggle_status, Some("u1"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let toggle_subtask = format!("/api/tasks/{}/subtasks/{}/toggle", id, subtask_id);
        let (_, done) = send(&app, "POST", &toggle_subtask, Some("u1"), None).await;
        assert_eq!(done["status"], "done");
        assert_eq!(done["progress"], 100);

        let (_, reopened) = send(&app, "POST", &toggle_subtask, Some("u1"), None).await;
        assert_eq!(reopened["status"], "todo");

        let forced = format!("{}?confirmed=true", toggle_status);
        let (status, body) = send(&app, "POST", &forced, Some("u1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "done");
    }

    #[tokio::test]
    async fn patch_clears_due_date() {
        let app = super::router().with_state(build_state().await);
        let (_, created) = send(
            &app,
            "POST",
            "/api/tasks",
            Some("u1"),
            Some(json!({ "title": "dated", "dueDate": "2030-05-01" })),
        )
        .await;
        let uri = format!("/api/tasks/{}", created["id"].as_str().unwrap());

        let (status, updated) = send(
            &app,
            "PATCH",
            &uri,
            Some("u1"),
            Some(json!({ "dueDate": null, "priority": "medium" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["dueDate"], serde_json::Value::Null);
        assert_eq!(updated["priority"], "medium");
    }
}
