use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ChunkId, MeetingId};

/// One turn of the chat log. Messages are immutable once created and
/// ordered by `created_at`; a `meeting_id` of `None` means the turn was
/// asked across all meetings.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: MessageId,
    pub meeting_id: Option<MeetingId>,
    pub role: MessageRole,
    pub content: String,
    pub sources: Vec<SourceRef>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: String, meeting_id: Option<MeetingId>) -> Self {
        Self::new(MessageRole::User, content, meeting_id, Vec::new())
    }

    pub fn assistant(
        content: String,
        meeting_id: Option<MeetingId>,
        sources: Vec<SourceRef>,
    ) -> Self {
        Self::new(MessageRole::Assistant, content, meeting_id, sources)
    }

    fn new(
        role: MessageRole,
        content: String,
        meeting_id: Option<MeetingId>,
        sources: Vec<SourceRef>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            meeting_id,
            role,
            content,
            sources,
            created_at: Utc::now(),
        }
    }
}

/// Pointer from an assistant reply back to the chunk it drew on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub chunk_id: Uuid,
    pub meeting_id: Uuid,
    pub similarity: f32,
}

impl SourceRef {
    pub fn new(chunk_id: ChunkId, meeting_id: MeetingId, similarity: f32) -> Self {
        Self {
            chunk_id: chunk_id.as_uuid(),
            meeting_id: meeting_id.as_uuid(),
            similarity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            _ => Err(format!("Invalid message role: {}", s)),
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
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

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}
