use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::services::Ranked;
use crate::domain::{Meeting, MeetingId, Summary};
use crate::presentation::state::AppState;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Serialize)]
pub struct MeetingResponse {
    pub id: String,
    pub client_name: String,
    pub status: String,
    pub transcript: Option<String>,
    pub summary: Option<Summary>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Meeting> for MeetingResponse {
    fn from(meeting: Meeting) -> Self {
        Self {
            id: meeting.id.as_uuid().to_string(),
            client_name: meeting.client_name,
            status: meeting.status.as_str().to_string(),
            transcript: meeting.transcript,
            summary: meeting.summary,
            created_at: meeting.created_at.to_rfc3339(),
            updated_at: meeting.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct SearchHit {
    pub similarity: f32,
    #[serde(flatten)]
    pub meeting: MeetingResponse,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub before: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

fn is_supported_media_type(media_type: &str) -> bool {
    media_type.starts_with("audio/") || media_type == "video/webm"
}

#[tracing::instrument(skip(state, multipart))]
pub async fn create_meeting_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut client_name: Option<String> = None;
    let mut upload: Option<(String, String, bytes::Bytes)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read multipart");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("Failed to read multipart: {}", e),
                    }),
                )
                    .into_response();
            }
        };

        match field.name() {
            Some("client_name") => match field.text().await {
                Ok(text) => client_name = Some(text),
                Err(e) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(ErrorResponse {
                            error: format!("Failed to read client_name: {}", e),
                        }),
                    )
                        .into_response();
                }
            },
            Some("file") => {
                let filename = field.file_name().unwrap_or("recording").to_string();
                let media_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();

                if !is_supported_media_type(&media_type) {
                    tracing::warn!(media_type = %media_type, "Unsupported media type");
                    return (
                        StatusCode::UNSUPPORTED_MEDIA_TYPE,
                        Json(ErrorResponse {
                            error: format!("Unsupported media type: {}", media_type),
                        }),
                    )
                        .into_response();
                }

                match field.bytes().await {
                    Ok(data) => upload = Some((filename, media_type, data)),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to read file bytes");
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(ErrorResponse {
                                error: format!("Failed to read file: {}", e),
                            }),
                        )
                            .into_response();
                    }
                }
            }
            _ => {}
        }
    }

    let client_name = match client_name {
        Some(name) if !name.trim().is_empty() => name,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Missing client_name field".to_string(),
                }),
            )
                .into_response();
        }
    };

    let (filename, media_type, data) = match upload {
        Some(u) => u,
        None => {
            tracing::warn!("Meeting upload with no file");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "No file uploaded".to_string(),
                }),
            )
                .into_response();
        }
    };

    tracing::debug!(bytes = data.len(), filename = %filename, "Audio data received");

    let stream = futures::stream::once(async move { Ok(data) }).boxed();

    match state
        .meeting_service
        .create(client_name, filename, media_type, stream)
        .await
    {
        Ok(meeting) => {
            (StatusCode::ACCEPTED, Json(MeetingResponse::from(meeting))).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create meeting");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to create meeting: {}", e),
                }),
            )
                .into_response()
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn get_meeting_handler(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
) -> impl IntoResponse {
    let uuid = match Uuid::parse_str(&meeting_id) {
        Ok(u) => u,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid meeting ID: {}", meeting_id),
                }),
            )
                .into_response();
        }
    };

    match state
        .meeting_service
        .get(MeetingId::from_uuid(uuid))
        .await
    {
        Ok(Some(meeting)) => {
            (StatusCode::OK, Json(MeetingResponse::from(meeting))).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Meeting not found: {}", meeting_id),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch meeting");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to fetch meeting: {}", e),
                }),
            )
                .into_response()
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn list_meetings_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);

    match state.meeting_service.list(limit, query.before).await {
        Ok(meetings) => {
            let response: Vec<MeetingResponse> =
                meetings.into_iter().map(MeetingResponse::from).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to list meetings");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to list meetings: {}", e),
                }),
            )
                .into_response()
        }
    }
}

#[tracing::instrument(skip(state, query))]
pub async fn search_meetings_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    if query.q.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Query parameter q must not be empty".to_string(),
            }),
        )
            .into_response();
    }

    match state.meeting_service.search(&query.q).await {
        Ok(ranked) => {
            let hits: Vec<SearchHit> = ranked
                .into_iter()
                .map(|r: Ranked<Meeting>| SearchHit {
                    similarity: r.similarity,
                    meeting: MeetingResponse::from(r.item),
                })
                .collect();
            (StatusCode::OK, Json(hits)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Meeting search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Search failed: {}", e),
                }),
            )
                .into_response()
        }
    }
}
