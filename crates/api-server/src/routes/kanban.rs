//! Kanban board endpoints

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::debug;

use taskdeck_core::kanban::{DragGesture, DropOutcome, DropTarget, KanbanBoardView};
use taskdeck_core::task::Task;

use super::task::owned_task;
use super::{api_error, session_user, RouteError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropRequest {
    pub task_id: String,
    #[serde(default)]
    pub over: Option<DropTarget>,
    /// Confirms a drop into `done` while subtasks are pending
    #[serde(default)]
    pub confirmed: bool,
}

/// GET /api/kanban - Columns and the tasks not yet on the board
async fn get_board(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<KanbanBoardView>, RouteError> {
    let user_id = session_user(&headers)?;
    let board = state.board(&user_id);
    board.load(&user_id).await.map_err(api_error)?;
    Ok(Json(board.view()))
}

/// POST /api/kanban/{id}/add - Put an available task in the first column
async fn add_to_board(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Task>, RouteError> {
    let user_id = session_user(&headers)?;
    owned_task(&state, &user_id, &id).await?;

    let task = state
        .board(&user_id)
        .add_to_board(&id)
        .await
        .map_err(api_error)?;
    Ok(Json(task))
}

/// POST /api/kanban/drop - Finish a drag gesture
async fn drop_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DropRequest>,
) -> Result<Json<DropOutcome>, RouteError> {
    let user_id = session_user(&headers)?;
    owned_task(&state, &user_id, &req.task_id).await?;

    let board = state.board(&user_id);
    board.load(&user_id).await.map_err(api_error)?;

    let gesture = DragGesture {
        task_id: req.task_id,
        over: req.over,
    };
    let outcome = board
        .drop_task(&gesture, req.confirmed)
        .await
        .map_err(api_error)?;
    debug!("Drop of {} finished: {:?}", gesture.task_id, outcome);
    Ok(Json(outcome))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/kanban", get(get_board))
        .route("/api/kanban/{id}/add", post(add_to_board))
        .route("/api/kanban/drop", post(drop_task))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use taskdeck_core::task::{NewTask, Subtask};

    use crate::routes::test_support::{build_state, send};
    use crate::state::AppState;

    async fn task_on_board(state: &AppState, task: NewTask) -> String {
        let task = state.repository().create_task("u1", task).await.unwrap();
        task.id
    }

    fn column_ids(board: &Value, column: usize) -> Vec<String> {
        board["columns"][column]["tasks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn add_then_drag_to_done() {
        let state = build_state().await;
        let id = task_on_board(&state, NewTask::new("ship it")).await;
        let app = super::router().with_state(state);

        let (_, board) = send(&app, "GET", "/api/kanban", Some("u1"), None).await;
        assert_eq!(board["available"].as_array().unwrap().len(), 1);
        assert_eq!(board["columns"][0]["title"], "To Do");

        let (status, added) =
            send(&app, "POST", &format!("/api/kanban/{}/add", id), Some("u1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(added["inKanban"], true);
        assert_eq!(added["status"], "todo");

        let (status, outcome) = send(
            &app,
            "POST",
            "/api/kanban/drop",
            Some("u1"),
            Some(json!({ "taskId": id, "over": { "type": "column", "id": "done" } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["outcome"], "moved");
        assert_eq!(outcome["announcement"], "Task moved to Done");

        let (_, board) = send(&app, "GET", "/api/kanban", Some("u1"), None).await;
        assert_eq!(column_ids(&board, 2), vec![id]);
        assert!(column_ids(&board, 0).is_empty());
    }

    #[tokio::test]
    async fn drop_on_same_column_is_unchanged() {
        let state = build_state().await;
        let id = task_on_board(&state, NewTask::new("stay")).await;
        state.repository().add_to_board(&id).await.unwrap();
        let app = super::router().with_state(state);

        let (_, outcome) = send(
            &app,
            "POST",
            "/api/kanban/drop",
            Some("u1"),
            Some(json!({ "taskId": id, "over": { "type": "column", "id": "todo" } })),
        )
        .await;
        assert_eq!(outcome["outcome"], "unchanged");
        assert_eq!(outcome["reason"], "same-column");

        let (_, outcome) = send(
            &app,
            "POST",
            "/api/kanban/drop",
            Some("u1"),
            Some(json!({ "taskId": id })),
        )
        .await;
        assert_eq!(outcome["reason"], "outside-columns");
    }

    #[tokio::test]
    async fn pending_subtasks_need_confirmation() {
        let state = build_state().await;
        let id = task_on_board(
            &state,
            NewTask::new("big").with_subtask(Subtask::new("step")),
        )
        .await;
        state.repository().add_to_board(&id).await.unwrap();
        let app = super::router().with_state(state);

        let drop = json!({ "taskId": id, "over": { "type": "column", "id": "done" } });
        let (_, outcome) =
            send(&app, "POST", "/api/kanban/drop", Some("u1"), Some(drop.clone())).await;
        assert_eq!(outcome["outcome"], "needs-confirmation");
        assert_eq!(outcome["taskId"], id);

        let mut confirmed = drop;
        confirmed["confirmed"] = json!(true);
        let (_, outcome) =
            send(&app, "POST", "/api/kanban/drop", Some("u1"), Some(confirmed)).await;
        assert_eq!(outcome["outcome"], "moved");
    }

    #[tokio::test]
    async fn other_users_cannot_move_tasks() {
        let state = build_state().await;
        let id = task_on_board(&state, NewTask::new("mine")).await;
        let app = super::router().with_state(state);

        let (status, _) = send(
            &app,
            "POST",
            "/api/kanban/drop",
            Some("u2"),
            Some(json!({ "taskId": id, "over": { "type": "column", "id": "done" } })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
