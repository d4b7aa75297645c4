use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::TaskId;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct TaskStatusResponse {
    pub id: String,
    pub meeting_id: String,
    pub status: String,
    pub attempts: u32,
    pub last_error: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[tracing::instrument(skip(state))]
pub async fn task_status_handler(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    let uuid = match Uuid::parse_str(&task_id) {
        Ok(u) => u,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid task ID: {}", task_id),
                }),
            )
                .into_response();
        }
    };

    match state.task_queue.get_state(TaskId::from_uuid(uuid)).await {
        Ok(Some(task_state)) => {
            let response = TaskStatusResponse {
                id: task_id,
                meeting_id: task_state.meeting_id.as_uuid().to_string(),
                status: task_state.status.as_str().to_string(),
                attempts: task_state.attempts,
                last_error: task_state.last_error,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        // Completed tasks are deleted from the queue, so "not found" also
        // covers tasks that finished successfully.
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Task not found: {}", task_id),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch task status");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to fetch task: {}", e),
                }),
            )
                .into_response()
        }
    }
}
