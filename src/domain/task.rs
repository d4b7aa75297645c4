use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{MeetingId, StoragePath};

/// A "process this meeting" task. Exactly one is created per meeting;
/// delivery is at-least-once, so the worker must tolerate re-running the
/// same task after a crash.
#[derive(Debug, Clone)]
pub struct ProcessingTask {
    pub id: TaskId,
    pub meeting_id: MeetingId,
    pub storage_path: StoragePath,
    pub media_type: String,
    pub created_at: DateTime<Utc>,
}

impl ProcessingTask {
    pub fn new(meeting_id: MeetingId, storage_path: StoragePath, media_type: String) -> Self {
        Self {
            id: TaskId::new(),
            meeting_id,
            storage_path,
            media_type,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
