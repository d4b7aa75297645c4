use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::RepositoryError;
use crate::domain::{ChatMessage, MeetingId};

#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Persist a user question and its assistant reply together. Both
    /// records are written or neither.
    async fn append_pair(
        &self,
        user: &ChatMessage,
        assistant: &ChatMessage,
    ) -> Result<(), RepositoryError>;

    /// Newest-first page of messages, filtered by meeting scope and an
    /// optional creation-timestamp cursor (strictly before).
    async fn history(
        &self,
        limit: usize,
        before: Option<DateTime<Utc>>,
        scope: Option<MeetingId>,
    ) -> Result<Vec<ChatMessage>, RepositoryError>;
}
