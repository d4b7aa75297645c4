use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ChatMessage, MeetingId, SourceRef};
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::state::AppState;

const DEFAULT_HISTORY_LIMIT: usize = 50;
const MAX_HISTORY_LIMIT: usize = 200;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub query: String,
    pub meeting_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
    pub before: Option<DateTime<Utc>>,
    pub meeting_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct ChatMessageResponse {
    pub id: String,
    pub meeting_id: Option<String>,
    pub role: String,
    pub content: String,
    pub sources: Vec<SourceRef>,
    pub created_at: String,
}

impl From<ChatMessage> for ChatMessageResponse {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id.as_uuid().to_string(),
            meeting_id: message.meeting_id.map(|id| id.as_uuid().to_string()),
            role: message.role.as_str().to_string(),
            content: message.content,
            sources: message.sources,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[tracing::instrument(skip(state, request))]
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    if request.query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Query must not be empty".to_string(),
            }),
        )
            .into_response();
    }

    tracing::info!(query = %sanitize_prompt(&request.query), "Chat request received");

    let scope = request.meeting_id.map(MeetingId::from_uuid);

    match state.chat_service.answer(&request.query, scope).await {
        Ok(result) => (
            StatusCode::OK,
            Json(ChatResponse {
                answer: result.answer,
                sources: result.sources,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Chat request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Chat failed: {}", e),
                }),
            )
                .into_response()
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn chat_history_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);
    let scope = query.meeting_id.map(MeetingId::from_uuid);

    match state.chat_service.history(limit, query.before, scope).await {
        Ok(messages) => {
            let response: Vec<ChatMessageResponse> = messages
                .into_iter()
                .map(ChatMessageResponse::from)
                .collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch chat history");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to fetch history: {}", e),
                }),
            )
                .into_response()
        }
    }
}
