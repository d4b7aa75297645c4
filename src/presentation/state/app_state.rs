use std::sync::Arc;

use crate::application::ports::TaskQueue;
use crate::application::services::{ChatService, MeetingService};

/// Shared handler state. Everything is behind an `Arc`, so cloning per
/// request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub meeting_service: Arc<MeetingService>,
    pub chat_service: Arc<ChatService>,
    pub task_queue: Arc<dyn TaskQueue>,
}
