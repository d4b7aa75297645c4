use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    chat_handler, chat_history_handler, create_meeting_handler, get_meeting_handler,
    health_handler, list_meetings_handler, search_meetings_handler, task_status_handler,
};
use crate::presentation::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/meetings", post(create_meeting_handler))
        .route("/api/v1/meetings", get(list_meetings_handler))
        .route("/api/v1/meetings/search", get(search_meetings_handler))
        .route("/api/v1/meetings/{meeting_id}", get(get_meeting_handler))
        .route("/api/v1/chat", post(chat_handler))
        .route("/api/v1/chat/history", get(chat_history_handler))
        .route("/api/v1/tasks/{task_id}", get(task_status_handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
