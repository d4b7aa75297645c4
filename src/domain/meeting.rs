use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Embedding, MeetingStatus, Summary};

/// A recorded meeting and everything the pipeline derives from it.
///
/// Transcript, summary and embedding are absent until the worker moves the
/// meeting to `Completed`; read paths never mutate a meeting.
#[derive(Debug, Clone)]
pub struct Meeting {
    pub id: MeetingId,
    pub client_name: String,
    pub status: MeetingStatus,
    pub transcript: Option<String>,
    pub summary: Option<Summary>,
    pub embedding: Option<Embedding>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    pub fn new(client_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: MeetingId::new(),
            client_name,
            status: MeetingStatus::Processing,
            transcript: None,
            summary: None,
            embedding: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeetingId(Uuid);

impl MeetingId {
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

impl Default for MeetingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MeetingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
