use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::RepositoryError;
use crate::domain::{Embedding, Meeting, MeetingId, Summary};

/// Persistent record of meetings. Status writes happen through the two
/// `mark_*` methods so a meeting transitions exactly once out of
/// `Processing`.
#[async_trait]
pub trait MeetingRepository: Send + Sync {
    async fn create(&self, meeting: &Meeting) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: MeetingId) -> Result<Option<Meeting>, RepositoryError>;

    /// Newest-first page, optionally only meetings created strictly before
    /// the cursor.
    async fn list(
        &self,
        limit: usize,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Meeting>, RepositoryError>;

    /// All completed meetings, for whole-document semantic search.
    async fn list_completed(&self) -> Result<Vec<Meeting>, RepositoryError>;

    async fn mark_completed(
        &self,
        id: MeetingId,
        transcript: &str,
        summary: &Summary,
        embedding: &Embedding,
    ) -> Result<(), RepositoryError>;

    async fn mark_failed(&self, id: MeetingId) -> Result<(), RepositoryError>;
}
